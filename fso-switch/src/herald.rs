//! Unidade de heralding: detector BSM + carimbo do id de requisição

use fso_core::{CorrectionMessage, DetectorConfig, Heralding, RequestId, Side, Signal, SimTime};
use fso_detector::{Arm, BsmDetector, DetectorStats, Report};
use rand::Rng;
use tracing::debug;

use crate::error::SwitchResult;

/// Efeito de um fóton na unidade de heralding
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeraldStep {
    /// Mensagens para a saída de controle
    pub messages: Vec<CorrectionMessage>,
    /// Janela a expirar
    pub armed: Option<Arm>,
}

/// Detector com saída clássica única para o controle
#[derive(Debug)]
pub struct HeraldUnit {
    detector: BsmDetector,
    latest_request: Option<RequestId>,
}

impl HeraldUnit {
    pub fn new(config: &DetectorConfig) -> SwitchResult<Self> {
        Ok(Self {
            detector: BsmDetector::new(config)?,
            latest_request: None,
        })
    }

    /// Último id de requisição visto numa entrada
    pub fn latest_request(&self) -> Option<RequestId> {
        self.latest_request
    }

    pub fn stats(&self) -> DetectorStats {
        self.detector.stats()
    }

    pub fn receive<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: SimTime,
        side: Side,
        signal: Signal,
    ) -> SwitchResult<HeraldStep> {
        if let Some(request) = signal.header.request {
            self.latest_request = Some(request);
        }
        let step = self.detector.receive(rng, now, side, signal)?;
        Ok(HeraldStep {
            messages: self.stamp(step.reports),
            armed: step.armed,
        })
    }

    pub fn expire<R: Rng + ?Sized>(&mut self, rng: &mut R, window_id: u64) -> SwitchResult<Vec<CorrectionMessage>> {
        let reports = self.detector.expire(rng, window_id)?;
        Ok(self.stamp(reports))
    }

    /// Uma mensagem por janela fechada (os lados recebem o mesmo resultado)
    fn stamp(&self, reports: Vec<Report>) -> Vec<CorrectionMessage> {
        let mut messages = Vec::new();
        let mut last_window = None;
        for report in reports {
            if last_window == Some(report.window_id) {
                continue;
            }
            last_window = Some(report.window_id);
            let heralding = Heralding::from(report.primary());
            debug!(
                window = report.window_id,
                request = ?self.latest_request,
                discriminator = heralding.discriminator,
                "heralding result"
            );
            messages.push(CorrectionMessage::new(self.latest_request, heralding).with_emissions(report.emissions));
        }
        messages
    }
}
