//! # 🧭 fso-control — Nó de Controle
//!
//! Resolve dois endpoints numa configuração de switches para a topologia
//! ativa e correlaciona as mensagens de correção assíncronas com o par de
//! endpoints que originou a requisição.
//!
//! ## Arquitetura
//!
//! ```text
//!  request_route(a, b)                    herald (switch cout)
//!        │                                        │
//!        ▼                                        ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │ NodeRegistry │──▶│   Topology   │   │   PendingTable   │
//! └──────────────┘   │ simple│ring│  │   │ id → (a, b)      │
//!                    │ tree         │   └──────────────────┘
//!                    └──────┬───────┘            │
//!                           ▼                    ▼
//!                   SwitchCommand[]        Delivery → a, b
//! ```
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_control::*;
//!
//! let mut control = ControlNode::new(name, Topology::Ring { switches: 4 }, &config, seed)?;
//! control.register_nodes(nodes);
//! let id = control.request_route(&mut switches, &a, &b, now)?;
//! let delivery = control.handle_correction(message)?;
//! ```

pub mod control;
pub mod error;
pub mod pending;
pub mod registry;
pub mod topology;

pub use control::{ControlNode, Delivery};
pub use error::{ControlError, ControlResult};
pub use pending::{PendingTable, Request, RequestState};
pub use registry::{EndpointRef, NodeRegistry, Role};
pub use topology::{DEFAULT_BRANCH_SIZE, RING_ENDPOINTS_PER_SWITCH, SwitchCommand, Topology};
