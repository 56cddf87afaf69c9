//! Erros do detector BSM

use fso_core::Encoding;
use thiserror::Error;

pub type DetectorResult<T> = Result<T, DetectorError>;

/// Erros fatais de configuração ou de sinal
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectorError {
    /// Parâmetro fora de [0, 1]
    #[error("Invalid detector parameter {name}: {value} not in [0, 1]")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Entradas com codificações diferentes no mesmo evento
    #[error("Inconsistent encodings: {left:?} vs {right:?}")]
    MixedEncoding { left: Encoding, right: Encoding },

    /// Número de modos difere entre as entradas
    #[error("Mode count mismatch: {left} vs {right}")]
    ModeCountMismatch { left: usize, right: usize },

    /// Fóton time-bin sem bin definido
    #[error("Time-bin photon without a bin in mode {0}")]
    MissingTimeBin(usize),
}
