//! Laço de retry sobre os dois endpoints

use fso_core::{AttemptRecord, Phase, SessionFailure, SimDuration};
use fso_sim::{Condition, Step, Task, TaskContext, TaskId, Wake};
use tracing::{debug, error, info};

use crate::attempt::{AttemptOutcome, AttemptStatus, EntanglementAttempt};
use crate::error::ProtocolError;
use crate::network::Network;
use crate::node::{EndpointPair, Party};

/// Resultado de um laço de retry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryOutcome {
    pub success: bool,
    pub records: Vec<AttemptRecord>,
    pub failure: Option<SessionFailure>,
}

impl RetryOutcome {
    /// Tentativas realizadas
    pub fn attempts(&self) -> u32 {
        self.records.len() as u32
    }
}

/// Repete a tentativa nos dois endpoints até ambos terem sucesso
///
/// A rota já deve estar configurada: uma única rota serve todas as
/// tentativas do laço.
#[derive(Debug)]
pub struct RetryProtocol {
    pair: EndpointPair,
    phase: Phase,
    max_attempts: u32,
    timeout: SimDuration,
    /// Tentativas de fases anteriores da sessão
    prior_attempts: u32,
    attempt: u32,
    running: Option<(TaskId, TaskId)>,
    records: Vec<AttemptRecord>,
}

impl RetryProtocol {
    pub fn new(pair: EndpointPair, phase: Phase, max_attempts: u32, timeout: SimDuration) -> Self {
        Self {
            pair,
            phase,
            max_attempts,
            timeout,
            prior_attempts: 0,
            attempt: 0,
            running: None,
            records: Vec::new(),
        }
    }

    /// Continua a contagem acumulada de uma sessão
    pub fn after(mut self, prior_attempts: u32) -> Self {
        self.prior_attempts = prior_attempts;
        self
    }

    fn start_attempt(&mut self, cx: &mut TaskContext<'_, Network>) -> Step<RetryOutcome> {
        self.attempt += 1;
        info!(phase = %self.phase, attempt = self.attempt, "entanglement attempt");
        let correcting = cx.spawn(EntanglementAttempt::new(
            self.pair.correcting.clone(),
            Party::Correcting,
            self.timeout,
        ));
        let passive = cx.spawn(EntanglementAttempt::new(
            self.pair.passive.clone(),
            Party::Passive,
            self.timeout,
        ));
        self.running = Some((correcting, passive));
        Step::Wait(Condition::all([
            Condition::finished(correcting),
            Condition::finished(passive),
        ]))
    }

    fn done(&mut self, success: bool, failure: Option<SessionFailure>) -> Step<RetryOutcome> {
        Step::Done(RetryOutcome {
            success,
            records: std::mem::take(&mut self.records),
            failure,
        })
    }

    /// Registra a tentativa na saída e na trilha da rede (sobrevive a falhas do kernel)
    fn record(&mut self, cx: &mut TaskContext<'_, Network>, correcting: &AttemptOutcome, passive: &AttemptOutcome) {
        let success = correcting.success() && passive.success();
        // Motivo da primeira parte que falhou, corretor primeiro
        let log_reason = if !correcting.success() || success {
            correcting.log()
        } else {
            passive.log()
        };
        let record = AttemptRecord {
            phase: self.phase,
            attempt_number: self.attempt,
            total_attempts: self.prior_attempts + self.attempt,
            timestamp: cx.now(),
            success,
            log_reason,
        };
        cx.act(|net, _| net.record_attempt(record.clone()));
        self.records.push(record);
    }
}

impl Task<Network> for RetryProtocol {
    type Output = RetryOutcome;

    fn resume(
        &mut self,
        cx: &mut TaskContext<'_, Network>,
        _wake: &Wake,
    ) -> Result<Step<RetryOutcome>, ProtocolError> {
        let Some((correcting_id, passive_id)) = self.running.take() else {
            if self.max_attempts == 0 {
                return Ok(self.done(
                    false,
                    Some(SessionFailure::AttemptsExhausted {
                        phase: self.phase,
                        attempts: 0,
                    }),
                ));
            }
            return Ok(self.start_attempt(cx));
        };

        let correcting: AttemptOutcome = cx.take_output(correcting_id)?;
        let passive: AttemptOutcome = cx.take_output(passive_id)?;
        info!(
            phase = %self.phase,
            attempt = self.attempt,
            correcting = %correcting.status,
            passive = %passive.status,
            "attempt done"
        );
        self.record(cx, &correcting, &passive);

        if correcting.success() && passive.success() {
            return Ok(self.done(true, None));
        }

        let bad = [correcting.status, passive.status]
            .into_iter()
            .find_map(|status| match status {
                AttemptStatus::BadDiscriminator(value) => Some(value),
                _ => None,
            });
        if let Some(value) = bad {
            error!(phase = %self.phase, value, "detector/protocol contract violated");
            return Ok(self.done(false, Some(SessionFailure::BadDiscriminator(value))));
        }

        if self.attempt >= self.max_attempts {
            error!(phase = %self.phase, attempts = self.attempt, "attempt budget exhausted");
            return Ok(self.done(
                false,
                Some(SessionFailure::AttemptsExhausted {
                    phase: self.phase,
                    attempts: self.attempt,
                }),
            ));
        }

        debug!(phase = %self.phase, "failed, retrying");
        Ok(self.start_attempt(cx))
    }

    fn label(&self) -> &'static str {
        "entanglement-retry"
    }
}
