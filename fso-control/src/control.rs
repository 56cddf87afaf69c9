//! Nó de controle: roteamento por topologia e relay de correções

use fso_core::{ControlConfig, CorrectionMessage, NodeName, RequestId, SimDuration, SimTime};
use fso_switch::{RoutingTable, SwitchFabric};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::error::{ControlError, ControlResult};
use crate::pending::{PendingTable, Request};
use crate::registry::{EndpointRef, NodeRegistry, Role};
use crate::topology::{SwitchCommand, Topology};

/// Correção a entregar aos dois endpoints da requisição
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub request: RequestId,
    pub endpoints: [NodeName; 2],
    pub message: CorrectionMessage,
}

/// Correlacionador requisição/resposta
///
/// Não mede tempo por conta própria; o relógio é sempre passado pelo chamador.
#[derive(Debug)]
pub struct ControlNode {
    name: NodeName,
    topology: Topology,
    registry: NodeRegistry,
    pending: PendingTable,
    request_ttl: Option<SimDuration>,
    rng: StdRng,
}

impl ControlNode {
    pub fn new(name: NodeName, topology: Topology, config: &ControlConfig, seed: u64) -> ControlResult<Self> {
        topology.validate()?;
        Ok(Self {
            name,
            topology,
            registry: NodeRegistry::new(),
            pending: PendingTable::new(config.pending_capacity),
            request_ttl: config.request_ttl_ns.map(SimDuration::from_nanos),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Registra nós (duplicatas: última escrita vence)
    pub fn register_nodes(&mut self, nodes: impl IntoIterator<Item = (NodeName, Role)>) {
        for (name, role) in nodes {
            self.registry.register(name, role);
        }
    }

    fn resolve_endpoint(&self, name: &NodeName) -> ControlResult<EndpointRef> {
        self.registry
            .endpoint(name)
            .ok_or_else(|| ControlError::RouteUnavailable(format!("{name} is not a registered endpoint")))
    }

    /// Calcula comandos sem aplicá-los
    pub fn plan_route(&self, a: &NodeName, b: &NodeName) -> ControlResult<Vec<SwitchCommand>> {
        let a = self.resolve_endpoint(a)?;
        let b = self.resolve_endpoint(b)?;
        if a.name == b.name {
            return Err(ControlError::RouteUnavailable(format!(
                "cannot route {} to itself",
                a.name
            )));
        }
        self.topology.commands(&a, &b)
    }

    /// Configura os switches e emite id de requisição
    ///
    /// Nenhum comando é aplicado se algum endpoint não puder ser resolvido;
    /// se um comando falhar, os switches já alterados voltam à tabela anterior.
    pub fn request_route<F: SwitchFabric + ?Sized>(
        &mut self,
        fabric: &mut F,
        a: &NodeName,
        b: &NodeName,
        now: SimTime,
    ) -> ControlResult<RequestId> {
        let commands = match self.plan_route(a, b) {
            Ok(commands) => commands,
            Err(e) => {
                warn!(control = %self.name, %a, %b, error = %e, "route request refused");
                return Err(e);
            }
        };
        let mut applied: Vec<(NodeName, RoutingTable)> = Vec::with_capacity(commands.len());
        for command in &commands {
            debug!(control = %self.name, %command, "switch command");
            if let Some(switch) = fabric.switch_mut(command.switch()) {
                applied.push((command.switch().clone(), switch.routing().clone()));
            }
            if let Err(e) = command.apply(fabric) {
                warn!(control = %self.name, %command, error = %e, "switch command failed, route rolled back");
                for (name, table) in applied.into_iter().rev() {
                    if let Some(switch) = fabric.switch_mut(&name) {
                        switch.restore_routing(table);
                    }
                }
                return Err(e.into());
            }
        }

        if let Some(ttl) = self.request_ttl {
            for expired in self.pending.expire(now, ttl) {
                debug!(request = %expired.id, "request expired");
            }
        }

        let id = self.fresh_id();
        if let Some(evicted) = self.pending.insert(id, a.clone(), b.clone(), now) {
            warn!(request = %evicted.id, capacity = self.pending.capacity(), "pending table full, oldest request evicted");
        }
        info!(control = %self.name, request = %id, %a, %b, commands = commands.len(), "route established");
        Ok(id)
    }

    fn fresh_id(&mut self) -> RequestId {
        loop {
            let id = RequestId::random(&mut self.rng);
            if !self.pending.contains(&id) {
                return id;
            }
        }
    }

    /// Correlaciona correção com a requisição e endereça os dois endpoints
    pub fn handle_correction(&mut self, message: CorrectionMessage) -> ControlResult<Delivery> {
        let Some(id) = message.request else {
            warn!(control = %self.name, "correction without request id dropped");
            return Err(ControlError::MissingRequestId);
        };
        let Some(request) = self.pending.resolve(&id) else {
            warn!(control = %self.name, request = %id, "correction for unknown request dropped");
            return Err(ControlError::UnknownRequest(id));
        };
        debug!(
            request = %id,
            a = %request.endpoint_a,
            b = %request.endpoint_b,
            deliveries = request.deliveries,
            "relaying correction"
        );
        Ok(Delivery {
            request: id,
            endpoints: [request.endpoint_a.clone(), request.endpoint_b.clone()],
            message,
        })
    }

    /// Libera requisição encerrada pelo chamador
    pub fn release(&mut self, id: &RequestId) -> Option<Request> {
        self.pending.release(id)
    }

    /// Expira requisições mais velhas que `ttl`
    pub fn expire(&mut self, now: SimTime, ttl: SimDuration) -> Vec<Request> {
        self.pending.expire(now, ttl)
    }
}
