//! Tipos de erro para fso-core

use thiserror::Error;

/// Resultado customizado para operações do core
pub type CoreResult<T> = Result<T, CoreError>;

/// Erros de configuração, parsing e bootstrap
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid request id: {0}")]
    InvalidRequestId(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}
