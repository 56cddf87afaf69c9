//! # 🔬 fso-detector — Medição de Bell (BSM)
//!
//! Consome dois sinais quase simultâneos e produz um resultado de detecção
//! por lado, idêntico nos dois lados de um mesmo evento, considerando
//! eficiência de detecção, dark counts e visibilidade.
//!
//! ## Arquitetura
//!
//! ```text
//!   qin0 ──┐                       ┌──▶ Report(Left)
//!          ├─▶ CoincidenceWindow ──▶ ClickModel
//!   qin1 ──┘                       └──▶ Report(Right)
//! ```
//!
//! Um lado sem entrada não recebe resultado algum.
//!
//! ## Exemplo
//!
//! ```ignore
//! use fso_detector::*;
//!
//! let mut bsm = BsmDetector::new(&DetectorConfig::default())?;
//! let step = bsm.receive(&mut rng, now, Side::Left, signal)?;
//! let reports = bsm.expire(&mut rng, step.armed.unwrap().window_id)?;
//! ```

pub mod detector;
pub mod error;
pub mod model;
pub mod window;

pub use detector::{BsmDetector, DetectorStats, DetectorStep, Report};
pub use error::{DetectorError, DetectorResult};
pub use model::ClickModel;
pub use window::{Arm, Closed, CoincidenceWindow, Offer};

#[cfg(test)]
mod tests;
