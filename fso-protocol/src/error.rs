//! Tipos de erro para fso-protocol

use fso_control::ControlError;
use fso_core::{CoreError, NodeName};
use fso_detector::DetectorError;
use fso_sim::SimError;
use fso_switch::SwitchError;
use thiserror::Error;

use crate::backend::Program;

/// Resultado customizado para operações do protocolo
pub type ProtoResult<T> = Result<T, ProtocolError>;

/// Falhas da rede simulada e das máquinas de estados
///
/// Falhas comuns de tentativa (timeout, sem emaranhamento) não são erros:
/// ficam no [`AttemptStatus`](crate::AttemptStatus).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Switch error: {0}")]
    Switch(#[from] SwitchError),

    #[error("Detector error: {0}")]
    Detector(#[from] DetectorError),

    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeName),

    #[error("Processor of {node} busy, cannot start {program:?}")]
    ProcessorBusy { node: NodeName, program: Program },

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("No route requested for this session")]
    NoRoute,
}
