//! Erros do switch FSO

use fso_core::NodeName;
use fso_detector::DetectorError;
use thiserror::Error;

pub type SwitchResult<T> = Result<T, SwitchError>;

/// Erros de roteamento e de heralding
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SwitchError {
    /// Tabela proposta não é bijeção sobre as portas
    #[error("Invalid routing table: {0}")]
    InvalidRoutingTable(String),

    /// Nome de porta desconhecido
    #[error("Unknown port: {0}")]
    UnknownPort(String),

    /// Vizinho não registrado no switch
    #[error("Switch {switch} has no neighbour {neighbor}")]
    UnknownNeighbor { switch: NodeName, neighbor: NodeName },

    /// Switch inexistente na malha
    #[error("Unknown switch: {0}")]
    UnknownSwitch(NodeName),

    /// Erro do detector BSM
    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),
}
