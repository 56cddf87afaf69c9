//! Interface de sessão: rota, retry e destilação
//!
//! O chamador sempre recebe um [`ProtocolResult`]; falhas do kernel viram
//! [`SessionFailure::Fault`] com os registros feitos até a falha.

use fso_core::{AttemptRecord, NodeName, Phase, ProtocolConfig, ProtocolResult, RequestId, SessionFailure, SimDuration};
use fso_sim::Kernel;
use tracing::{error, info, warn};

use crate::distillation::ContinuousDistillation;
use crate::error::{ProtoResult, ProtocolError};
use crate::network::Network;
use crate::node::EndpointPair;
use crate::retry::RetryProtocol;

/// Sessão entre dois endpoints sobre uma rede
pub struct Session {
    kernel: Kernel<Network>,
    pair: Option<EndpointPair>,
    route: Option<RequestId>,
}

impl Session {
    pub fn new(network: Network) -> Self {
        let budget = network.config().max_events;
        Self {
            kernel: Kernel::new(network).with_event_budget(budget),
            pair: None,
            route: None,
        }
    }

    pub fn network(&self) -> &Network {
        self.kernel.world()
    }

    pub fn network_mut(&mut self) -> &mut Network {
        self.kernel.world_mut()
    }

    pub fn kernel(&self) -> &Kernel<Network> {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut Kernel<Network> {
        &mut self.kernel
    }

    /// Par ativo (`a` corrige, `b` é passivo)
    pub fn pair(&self) -> Option<&EndpointPair> {
        self.pair.as_ref()
    }

    /// Requisição ativa
    pub fn route(&self) -> Option<RequestId> {
        self.route
    }

    fn protocol(&self) -> &ProtocolConfig {
        &self.network().config().protocol
    }

    fn timeout(&self) -> SimDuration {
        self.network().timing().attempt_timeout()
    }

    /// Configura os switches para `a ↔ b` e fixa os papéis do par
    pub fn request_route(&mut self, a: &NodeName, b: &NodeName) -> ProtoResult<RequestId> {
        let pair = EndpointPair::new(a.clone(), b.clone());
        let now = self.kernel.now();
        let id = self.kernel.world_mut().request_route(&pair, now)?;
        if let Some(previous) = self.route.replace(id) {
            self.kernel.world_mut().release_route(&previous);
        }
        self.pair = Some(pair);
        Ok(id)
    }

    /// Libera a requisição ativa
    pub fn release_route(&mut self) -> bool {
        match self.route.take() {
            Some(id) => self.kernel.world_mut().release_route(&id),
            None => false,
        }
    }

    fn require_pair(&self) -> ProtoResult<EndpointPair> {
        self.pair.clone().ok_or(ProtocolError::NoRoute)
    }

    /// Laço de retry sobre a rota ativa
    pub fn run_retry(&mut self, max_attempts: u32) -> ProtocolResult {
        let pair = match self.require_pair() {
            Ok(pair) => pair,
            Err(e) => return no_route(e),
        };
        let retry = RetryProtocol::new(pair, Phase::Initial, max_attempts, self.timeout());
        self.network_mut().take_history();
        let outcome = self.kernel.run(retry);
        let history = self.network_mut().take_history();
        match outcome {
            Ok(outcome) => {
                info!(success = outcome.success, attempts = outcome.attempts(), "retry finished");
                match outcome.failure {
                    Some(failure) => ProtocolResult::failed(outcome.records, failure),
                    None => ProtocolResult::succeeded(outcome.records),
                }
            }
            Err(e) => fault(e, history),
        }
    }

    /// Destilação contínua com rotas novas por fase
    pub fn run_distillation(&mut self, max_attempts: u32, max_rounds: u32) -> ProtocolResult {
        let pair = match self.require_pair() {
            Ok(pair) => pair,
            Err(e) => return no_route(e),
        };
        // Cada fase pede sua própria rota
        self.release_route();
        let protocol = ProtocolConfig {
            max_attempts,
            max_rounds,
            ..self.protocol().clone()
        };
        let task = ContinuousDistillation::new(pair, &protocol, self.timeout());
        self.network_mut().take_history();
        let outcome = self.kernel.run(task);
        let history = self.network_mut().take_history();
        match outcome {
            Ok(result) => {
                info!(
                    success = result.success,
                    attempts = result.attempts,
                    rounds = result.rounds_completed,
                    "distillation finished"
                );
                result
            }
            Err(e) => fault(e, history),
        }
    }

    /// Destilação com os limites da configuração
    pub fn run_configured(&mut self) -> ProtocolResult {
        let ProtocolConfig {
            max_attempts,
            max_rounds,
            ..
        } = *self.protocol();
        self.run_distillation(max_attempts, max_rounds)
    }
}

fn no_route(e: ProtocolError) -> ProtocolResult {
    warn!(error = %e, "session has no route");
    ProtocolResult::failed(Vec::new(), SessionFailure::RouteUnavailable(e.to_string()))
}

/// Falha do kernel; devolve a trilha registrada até ali
fn fault(e: ProtocolError, records: Vec<AttemptRecord>) -> ProtocolResult {
    error!(error = %e, attempts = records.len(), "simulation fault");
    ProtocolResult::failed(records, SessionFailure::Fault(e.to_string()))
}
