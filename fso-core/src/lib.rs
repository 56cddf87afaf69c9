//! # 🔭 fso-core — Vocabulário da Rede FSO
//!
//! Tipos compartilhados por todas as camadas da rede de distribuição de
//! emaranhamento: nomes de nós, identificadores de requisição, tempo
//! simulado, índices de Bell, mensagens de correção, registros de tentativas
//! e configuração.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 fso-core                        │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  NodeName | RequestId | SimTime           │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  BellIndex | DetectionOutcome | Signal    │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  AttemptRecord | ProtocolResult           │  │
//! │  └───────────────────────────────────────────┘  │
//! │  ┌───────────────────────────────────────────┐  │
//! │  │  SimulationConfig (TOML) | telemetry      │  │
//! │  └───────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_core::prelude::*;
//!
//! let config = SimulationConfig::from_toml_str("seed = 7")?;
//! let outcome = DetectionOutcome::success(BellIndex::PsiPlus, Some(0));
//! assert_eq!(outcome.wire(), 1);
//! ```

pub mod bell;
pub mod config;
pub mod error;
pub mod message;
pub mod record;
pub mod telemetry;
pub mod types;

pub use bell::{BellIndex, Correction, DetectionOutcome, NO_ENTANGLEMENT};
pub use config::{
    BackendConfig, ChannelConfig, ControlConfig, DetectorConfig, ProtocolConfig,
    RoundFailurePolicy, SimulationConfig, SwitchConfig, TimingConfig,
};
pub use error::{CoreError, CoreResult};
pub use message::{CorrectionMessage, Encoding, Header, Heralding, Photon, Signal, TimeBin};
pub use record::{AttemptRecord, Phase, ProtocolResult, SessionFailure};
pub use types::{NodeName, RequestId, Side, SimDuration, SimTime};

/// Importações usuais
pub mod prelude {
    pub use crate::bell::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::message::*;
    pub use crate::record::*;
    pub use crate::types::*;
}
