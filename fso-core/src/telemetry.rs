//! Bootstrap de logging estruturado (`tracing`)

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{CoreError, CoreResult};

/// Filtro padrão quando `RUST_LOG` não está definido
pub const DEFAULT_DIRECTIVE: &str = "fso_protocol=info,fso_control=info,fso_switch=warn";

/// Instala o subscriber global
///
/// Usa `RUST_LOG` quando presente, senão `default_directive`. Falha se outro
/// subscriber já estiver instalado.
pub fn init_tracing(default_directive: &str) -> CoreResult<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| CoreError::Telemetry(e.to_string()))
}

/// Variante idempotente de [`init_tracing`] (ignora subscriber já instalado)
pub fn try_init_tracing(default_directive: &str) -> bool {
    init_tracing(default_directive).is_ok()
}
