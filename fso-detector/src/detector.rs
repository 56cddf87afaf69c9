//! Detector BSM de duas entradas

use fso_core::{DetectionOutcome, DetectorConfig, Side, Signal, SimTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DetectorResult;
use crate::model::ClickModel;
use crate::window::{Arm, Closed, CoincidenceWindow};

/// Resultado entregue a um lado
///
/// Ambos os lados de um mesmo evento recebem os mesmos `outcomes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub window_id: u64,
    pub side: Side,
    pub outcomes: Vec<DetectionOutcome>,
    /// Emissões dos sinais da janela (`[esquerda, direita]`)
    pub emissions: [Option<u64>; 2],
}

impl Report {
    /// Primeiro resultado (o único quando não há multi-modo)
    pub fn primary(&self) -> DetectionOutcome {
        self.outcomes
            .first()
            .copied()
            .unwrap_or_else(DetectionOutcome::failure)
    }
}

/// Efeito de uma entrada
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectorStep {
    pub reports: Vec<Report>,
    /// Janela aberta; o chamador agenda [`BsmDetector::expire`] em `close_at`
    pub armed: Option<Arm>,
}

/// Contadores do detector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorStats {
    /// Eventos com as duas entradas
    pub coincidences: u64,
    /// Eventos com sucesso
    pub heralded: u64,
    /// Janelas fechadas com um único lado
    pub one_sided: u64,
}

/// Detector BSM com janela de coincidência
#[derive(Debug)]
pub struct BsmDetector {
    model: ClickModel,
    window: CoincidenceWindow,
    stats: DetectorStats,
}

impl BsmDetector {
    pub fn new(config: &DetectorConfig) -> DetectorResult<Self> {
        Ok(Self::with_model(ClickModel::new(config)?, config))
    }

    pub fn with_model(model: ClickModel, config: &DetectorConfig) -> Self {
        Self {
            model,
            window: CoincidenceWindow::new(config.coincidence_window()),
            stats: DetectorStats::default(),
        }
    }

    pub fn stats(&self) -> DetectorStats {
        self.stats
    }

    /// Recebe sinal num dos lados
    pub fn receive<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: SimTime,
        side: Side,
        signal: Signal,
    ) -> DetectorResult<DetectorStep> {
        let offer = self.window.offer(now, side, signal);
        let mut step = DetectorStep {
            reports: Vec::new(),
            armed: offer.armed,
        };
        for closed in offer.closed {
            step.reports.extend(self.classify(rng, closed)?);
        }
        if let Some(arm) = step.armed {
            debug!(window = arm.window_id, ?side, close_at = %arm.close_at, "coincidence window opened");
        }
        Ok(step)
    }

    /// Fecha a janela expirada
    pub fn expire<R: Rng + ?Sized>(&mut self, rng: &mut R, window_id: u64) -> DetectorResult<Vec<Report>> {
        match self.window.expire(window_id) {
            Some(closed) => self.classify(rng, closed),
            None => Ok(Vec::new()),
        }
    }

    fn classify<R: Rng + ?Sized>(&mut self, rng: &mut R, closed: Closed) -> DetectorResult<Vec<Report>> {
        let window_id = closed.window_id;
        let emissions = [
            closed.left.as_ref().and_then(|s| s.header.emission),
            closed.right.as_ref().and_then(|s| s.header.emission),
        ];
        let (outcomes, sides) = match (&closed.left, &closed.right) {
            (Some(left), Some(right)) => {
                self.stats.coincidences += 1;
                let outcomes = self.model.measure(rng, left, right)?;
                if outcomes.iter().any(DetectionOutcome::is_success) {
                    self.stats.heralded += 1;
                }
                (outcomes, Side::BOTH.to_vec())
            }
            (None, None) => return Ok(Vec::new()),
            _ => {
                self.stats.one_sided += 1;
                (vec![DetectionOutcome::failure()], closed.senders())
            }
        };
        debug!(window = window_id, ?outcomes, "window classified");
        Ok(sides
            .into_iter()
            .map(|side| Report {
                window_id,
                side,
                outcomes: outcomes.clone(),
                emissions,
            })
            .collect())
    }
}
