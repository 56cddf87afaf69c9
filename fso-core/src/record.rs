//! Trilha de auditoria das tentativas e resultado de sessão

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::SimTime;

/// Fase do protocolo contínuo
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Geração do par base
    Initial,
    /// Rodada de destilação `k` (1..=N)
    Distillation(u32),
}

impl Phase {
    pub fn is_distillation(&self) -> bool {
        matches!(self, Self::Distillation(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "Initial"),
            Self::Distillation(k) => write!(f, "Distillation_{k}"),
        }
    }
}

/// Registro imutável de uma tentativa
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub phase: Phase,
    /// Número da tentativa dentro da fase (1-based)
    pub attempt_number: u32,
    /// Tentativas acumuladas na sessão até aqui
    pub total_attempts: u32,
    pub timestamp: SimTime,
    pub success: bool,
    /// Motivo do endpoint corretor (`corrected`, `timeout`, ...)
    pub log_reason: String,
}

/// Motivo terminal de uma sessão malsucedida
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionFailure {
    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    #[error("bad discriminator {0} from detector")]
    BadDiscriminator(i8),

    #[error("distillation mismatch in round {round}: outcomes {outcomes:?}")]
    DistillationMismatch { round: u32, outcomes: (u8, u8) },

    #[error("{phase}: no entanglement after {attempts} attempts")]
    AttemptsExhausted { phase: Phase, attempts: u32 },

    #[error("simulation fault: {0}")]
    Fault(String),
}

/// Resultado entregue ao chamador de uma sessão
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolResult {
    pub success: bool,
    /// Tentativas acumuladas
    pub attempts: u32,
    pub records: Vec<AttemptRecord>,
    /// Rodadas de destilação bem-sucedidas
    pub rounds_completed: u32,
    /// Rodadas falhas toleradas (política `Continue`)
    pub rounds_failed: u32,
    pub failure: Option<SessionFailure>,
}

impl ProtocolResult {
    pub fn succeeded(records: Vec<AttemptRecord>) -> Self {
        Self {
            success: true,
            attempts: records.len() as u32,
            records,
            rounds_completed: 0,
            rounds_failed: 0,
            failure: None,
        }
    }

    pub fn failed(records: Vec<AttemptRecord>, failure: SessionFailure) -> Self {
        Self {
            success: false,
            attempts: records.len() as u32,
            records,
            rounds_completed: 0,
            rounds_failed: 0,
            failure: Some(failure),
        }
    }

    /// Registros de uma fase
    pub fn records_in(&self, phase: Phase) -> impl Iterator<Item = &AttemptRecord> {
        self.records.iter().filter(move |r| r.phase == phase)
    }

    /// Último registro (condição de falha da última tentativa)
    pub fn last_record(&self) -> Option<&AttemptRecord> {
        self.records.last()
    }
}
