//! Endpoint com processador quântico e caixa de correções

use std::collections::VecDeque;
use std::fmt;

use fso_core::{CorrectionMessage, NodeName, RequestId};
use serde::{Deserialize, Serialize};

use crate::backend::Program;

/// Papel do endpoint no par
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    /// Aplica as correções
    Correcting,
    /// Aceita o estado resultante
    #[default]
    Passive,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Correcting => write!(f, "EBIT_CORRECT"),
            Self::Passive => write!(f, "EBIT_PASSIVE"),
        }
    }
}

/// Par de endpoints de uma sessão (papéis fixos)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointPair {
    pub correcting: NodeName,
    pub passive: NodeName,
}

impl EndpointPair {
    pub fn new(correcting: NodeName, passive: NodeName) -> Self {
        Self {
            correcting,
            passive,
        }
    }

    pub fn both(&self) -> [&NodeName; 2] {
        [&self.correcting, &self.passive]
    }
}

/// Endpoint (QPU)
#[derive(Debug, Clone)]
pub struct QpuNode {
    name: NodeName,
    party: Party,
    inbox: VecDeque<CorrectionMessage>,
    running: Option<Program>,
    request: Option<RequestId>,
    emission: Option<u64>,
    last_measurement: Option<u8>,
}

impl QpuNode {
    pub fn new(name: NodeName) -> Self {
        Self {
            name,
            party: Party::default(),
            inbox: VecDeque::new(),
            running: None,
            request: None,
            emission: None,
            last_measurement: None,
        }
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn party(&self) -> Party {
        self.party
    }

    pub fn set_party(&mut self, party: Party) {
        self.party = party;
    }

    /// Requisição carimbada nos fótons emitidos
    pub fn request(&self) -> Option<RequestId> {
        self.request
    }

    pub fn set_request(&mut self, request: Option<RequestId>) {
        self.request = request;
    }

    /// Sequência da emissão mais recente
    pub fn emission(&self) -> Option<u64> {
        self.emission
    }

    pub(crate) fn set_emission(&mut self, emission: u64) {
        self.emission = Some(emission);
    }

    pub fn is_busy(&self) -> bool {
        self.running.is_some()
    }

    pub fn running(&self) -> Option<Program> {
        self.running
    }

    pub(crate) fn begin(&mut self, program: Program) {
        self.running = Some(program);
    }

    pub(crate) fn finish(&mut self, measurement: Option<u8>) -> Option<Program> {
        if measurement.is_some() {
            self.last_measurement = measurement;
        }
        self.running.take()
    }

    /// Último bit medido pela destilação
    pub fn last_measurement(&self) -> Option<u8> {
        self.last_measurement
    }

    pub fn take_measurement(&mut self) -> Option<u8> {
        self.last_measurement.take()
    }

    pub fn deliver(&mut self, message: CorrectionMessage) {
        self.inbox.push_back(message);
    }

    pub fn pending_messages(&self) -> usize {
        self.inbox.len()
    }

    pub fn pop_message(&mut self) -> Option<CorrectionMessage> {
        self.inbox.pop_front()
    }

    /// Descarta mensagens velhas; devolve quantas
    pub fn flush_inbox(&mut self) -> usize {
        let stale = self.inbox.len();
        self.inbox.clear();
        stale
    }
}
