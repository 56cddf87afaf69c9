//! # 🔀 fso-switch — Switch Óptico de Espaço Livre
//!
//! Switch de três portas com tabela de roteamento mutável (sempre uma
//! bijeção), três caminhos internos de fibra selecionados pela distância
//! entre índices de porta, e uma unidade de heralding BSM ligada às saídas
//! `qout0` e `qout1`.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  FsoSwitch                    │
//! │  qin0 ─┐  ┌──────────────┐  ┌─ qout0 ─┐       │
//! │  qin1 ─┼─▶│ RoutingTable │──┼─ qout1 ─┼─▶ BSM ──▶ cout (controle)
//! │  qin2 ─┘  └──────────────┘  └─ qout2 ─┼─▶ link │
//! │           short | mid | long          │       │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_switch::*;
//!
//! let mut sw = FsoSwitch::new(NodeName::switch(0), &SwitchConfig::default(), &DetectorConfig::default())?;
//! sw.register(NodeName::endpoint(0), 0)?;
//! sw.register(NodeName::endpoint(1), 1)?;
//! sw.herald_switch(&NodeName::endpoint(1), &NodeName::endpoint(0))?;
//! ```

pub mod channel;
pub mod error;
pub mod herald;
pub mod routing;
pub mod switch;

pub use channel::{ChannelSet, FibreChannel, Tier};
pub use error::{SwitchError, SwitchResult};
pub use herald::{HeraldStep, HeraldUnit};
pub use routing::{InPort, LINK_PORT, OutPort, PORT_COUNT, RoutingTable};
pub use switch::{FsoSwitch, Relay, SwitchFabric};

#[cfg(test)]
mod tests;
