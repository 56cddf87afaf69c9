//! Erros do nó de controle

use fso_core::RequestId;
use fso_switch::SwitchError;
use thiserror::Error;

pub type ControlResult<T> = Result<T, ControlError>;

/// Erros de roteamento e correlação
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Endpoint não registrado ou fora da topologia
    #[error("Route unavailable: {0}")]
    RouteUnavailable(String),

    /// Correção com id desconhecido (nunca emitido, liberado ou expirado)
    #[error("Unknown request: {0}")]
    UnknownRequest(RequestId),

    /// Correção sem id de requisição
    #[error("Correction message carries no request id")]
    MissingRequestId,

    /// Parâmetros de topologia inválidos
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// Falha ao aplicar comando no switch
    #[error("Switch error: {0}")]
    Switch(#[from] SwitchError),
}
