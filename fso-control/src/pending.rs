//! Tabela de requisições pendentes
//!
//! Limitada em capacidade (o registro mais antigo é descartado) e com
//! expiração por idade, para que requisições nunca resolvidas não acumulem.

use std::collections::{HashMap, VecDeque};

use fso_core::{NodeName, RequestId, SimDuration, SimTime};
use serde::{Deserialize, Serialize};

/// Estado de uma requisição
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Resolved,
    Expired,
}

/// Requisição de rota entre dois endpoints
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub endpoint_a: NodeName,
    pub endpoint_b: NodeName,
    pub state: RequestState,
    pub created_at: SimTime,
    /// Correções entregues com este id
    pub deliveries: u32,
}

/// Tabela id → requisição
#[derive(Debug)]
pub struct PendingTable {
    capacity: usize,
    entries: HashMap<RequestId, Request>,
    order: VecDeque<RequestId>,
}

impl PendingTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &RequestId) -> Option<&Request> {
        self.entries.get(id)
    }

    /// Insere requisição nova; devolve a mais antiga se a capacidade estourou
    pub fn insert(&mut self, id: RequestId, a: NodeName, b: NodeName, now: SimTime) -> Option<Request> {
        let evicted = if self.entries.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };
        self.entries.insert(
            id,
            Request {
                id,
                endpoint_a: a,
                endpoint_b: b,
                state: RequestState::Pending,
                created_at: now,
                deliveries: 0,
            },
        );
        self.order.push_back(id);
        evicted
    }

    /// Marca entrega de correção
    ///
    /// A primeira entrega resolve a requisição; entregas seguintes com o mesmo
    /// id são idempotentes e apenas incrementam o contador.
    pub fn resolve(&mut self, id: &RequestId) -> Option<&Request> {
        let request = self.entries.get_mut(id)?;
        request.state = RequestState::Resolved;
        request.deliveries += 1;
        Some(request)
    }

    /// Remove requisição
    pub fn release(&mut self, id: &RequestId) -> Option<Request> {
        let request = self.entries.remove(id)?;
        self.order.retain(|queued| queued != id);
        Some(request)
    }

    /// Remove requisições mais velhas que `ttl`
    pub fn expire(&mut self, now: SimTime, ttl: SimDuration) -> Vec<Request> {
        let mut expired = Vec::new();
        while let Some(id) = self.order.front().copied() {
            let stale = self
                .entries
                .get(&id)
                .is_some_and(|r| now.since(r.created_at) > ttl);
            if !stale {
                break;
            }
            self.order.pop_front();
            if let Some(mut request) = self.entries.remove(&id) {
                request.state = RequestState::Expired;
                expired.push(request);
            }
        }
        expired
    }

    fn evict_oldest(&mut self) -> Option<Request> {
        let id = self.order.pop_front()?;
        let mut request = self.entries.remove(&id)?;
        request.state = RequestState::Expired;
        Some(request)
    }
}
