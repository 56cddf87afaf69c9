//! # 🔗 fso-protocol — Protocolos de Emaranhamento
//!
//! Rede simulada (endpoints, switches FSO, nó de controle) e as máquinas de
//! estados que a dirigem: tentativa única por endpoint, laço de retry e
//! destilação contínua com rodadas de purificação.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Session                           │
//! │   request_route ─▶ run_retry ─▶ run_distillation          │
//! └──────────────────────────┬────────────────────────────────┘
//!                            ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Kernel<Network> (fso-sim)                 │
//! │  ContinuousDistillation ─▶ RetryProtocol ─▶ Attempt × 2   │
//! └──────────────────────────┬────────────────────────────────┘
//!                            ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │ Network: QpuNode │ FsoSwitch │ ControlNode │ QuantumBackend│
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_protocol::*;
//!
//! let network = Network::ring(SimulationConfig::default(), 4)?;
//! let mut session = Session::new(network);
//! session.request_route(&NodeName::endpoint(1), &NodeName::endpoint(6))?;
//! let result = session.run_distillation(10, 3);
//! assert!(result.success);
//! ```

pub mod attempt;
pub mod backend;
pub mod distillation;
pub mod error;
pub mod network;
pub mod node;
pub mod retry;
pub mod session;

pub use attempt::{AttemptOutcome, AttemptStatus, EntanglementAttempt};
pub use backend::{AbstractBackend, Program, QuantumBackend};
pub use distillation::{ContinuousDistillation, DISTILLATION_TARGET};
pub use error::{ProtoResult, ProtocolError};
pub use network::{CONTROL_NODE, NetEvent, Network, NetworkStats};
pub use node::{EndpointPair, Party, QpuNode};
pub use retry::{RetryOutcome, RetryProtocol};
pub use session::Session;

pub use fso_core::{NodeName, ProtocolResult, SessionFailure, SimulationConfig};

#[cfg(test)]
mod tests;
