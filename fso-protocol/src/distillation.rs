//! Destilação contínua
//!
//! ```text
//! Initial (rota + retry) ──falha──▶ fim (nenhuma rodada tentada)
//!    │ ok
//!    ▼
//! Swap (ambos) ──▶ rodada k: rota + retry ──▶ Distill (ambos) ──▶ (1, 1)?
//!                      ▲                                          │
//!                      └────────────────── k < N ◀────────────────┘
//! ```

use fso_core::{
    AttemptRecord, Phase, ProtocolConfig, ProtocolResult, RequestId, RoundFailurePolicy,
    SessionFailure, SimDuration,
};
use fso_sim::{Condition, Step, Task, TaskContext, TaskId, Wake};
use tracing::{error, info, warn};

use crate::backend::Program;
use crate::error::{ProtoResult, ProtocolError};
use crate::network::Network;
use crate::node::EndpointPair;
use crate::retry::{RetryOutcome, RetryProtocol};

/// Medição que as duas partes precisam obter
pub const DISTILLATION_TARGET: (u8, u8) = (1, 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Start,
    Initial { retry: TaskId },
    Swapping,
    Round { round: u32, retry: TaskId },
    Distilling { round: u32 },
}

/// Orquestrador: par base, swap para a memória e N rodadas de purificação
#[derive(Debug)]
pub struct ContinuousDistillation {
    pair: EndpointPair,
    max_attempts: u32,
    max_rounds: u32,
    policy: RoundFailurePolicy,
    timeout: SimDuration,
    stage: Stage,
    route: Option<RequestId>,
    records: Vec<AttemptRecord>,
    rounds_completed: u32,
    rounds_failed: u32,
}

impl ContinuousDistillation {
    pub fn new(pair: EndpointPair, protocol: &ProtocolConfig, timeout: SimDuration) -> Self {
        Self {
            pair,
            max_attempts: protocol.max_attempts,
            max_rounds: protocol.max_rounds,
            policy: protocol.round_failure,
            timeout,
            stage: Stage::Start,
            route: None,
            records: Vec::new(),
            rounds_completed: 0,
            rounds_failed: 0,
        }
    }

    fn attempts(&self) -> u32 {
        self.records.len() as u32
    }

    /// Rota nova e laço de retry para a fase
    fn begin_phase(&mut self, cx: &mut TaskContext<'_, Network>, phase: Phase) -> ProtoResult<Option<TaskId>> {
        let pair = &self.pair;
        let route = cx.act(|net, wcx| net.request_route(pair, wcx.now()));
        match route {
            Ok(id) => self.route = Some(id),
            Err(ProtocolError::Control(e)) => {
                error!(%phase, error = %e, "route unavailable");
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        info!(%phase, request = ?self.route, "phase started");
        let retry = RetryProtocol::new(self.pair.clone(), phase, self.max_attempts, self.timeout)
            .after(self.attempts());
        Ok(Some(cx.spawn(retry)))
    }

    fn end_phase(&mut self, cx: &mut TaskContext<'_, Network>, retry: TaskId) -> ProtoResult<RetryOutcome> {
        let mut outcome: RetryOutcome = cx.take_output(retry)?;
        self.records.append(&mut outcome.records);
        if let Some(id) = self.route.take() {
            cx.act(|net, _| net.release_route(&id));
        }
        Ok(outcome)
    }

    /// Programa nos dois endpoints; espera ambos
    fn run_on_both(&mut self, cx: &mut TaskContext<'_, Network>, program: Program) -> ProtoResult<Condition> {
        for node in self.pair.both() {
            cx.act(|net, wcx| net.start_program(wcx, node, program))?;
        }
        Ok(Condition::all(
            self.pair.both().map(|node| Condition::program(node.clone())),
        ))
    }

    fn start_round(&mut self, cx: &mut TaskContext<'_, Network>, round: u32) -> ProtoResult<Step<ProtocolResult>> {
        if round > self.max_rounds {
            info!(
                completed = self.rounds_completed,
                failed = self.rounds_failed,
                "all distillation rounds done"
            );
            return Ok(self.succeed());
        }
        let phase = Phase::Distillation(round);
        match self.begin_phase(cx, phase)? {
            Some(retry) => {
                self.stage = Stage::Round { round, retry };
                Ok(Step::Wait(Condition::finished(retry)))
            }
            None => Ok(self.fail(SessionFailure::RouteUnavailable(format!(
                "{} <-> {}",
                self.pair.correcting, self.pair.passive
            )))),
        }
    }

    /// Rodada falhou; aborta ou segue conforme a política
    fn round_failed(
        &mut self,
        cx: &mut TaskContext<'_, Network>,
        round: u32,
        failure: SessionFailure,
    ) -> ProtoResult<Step<ProtocolResult>> {
        match self.policy {
            RoundFailurePolicy::Abort => {
                error!(round, %failure, "distillation round failed, aborting session");
                Ok(self.fail(failure))
            }
            RoundFailurePolicy::Continue => {
                warn!(round, %failure, "distillation round failed, continuing");
                self.rounds_failed += 1;
                self.start_round(cx, round + 1)
            }
        }
    }

    fn result(&mut self, success: bool, failure: Option<SessionFailure>) -> ProtocolResult {
        let records = std::mem::take(&mut self.records);
        let mut result = match failure {
            Some(failure) => ProtocolResult::failed(records, failure),
            None => ProtocolResult::succeeded(records),
        };
        result.success = success;
        result.rounds_completed = self.rounds_completed;
        result.rounds_failed = self.rounds_failed;
        result
    }

    fn succeed(&mut self) -> Step<ProtocolResult> {
        Step::Done(self.result(true, None))
    }

    fn fail(&mut self, failure: SessionFailure) -> Step<ProtocolResult> {
        Step::Done(self.result(false, Some(failure)))
    }
}

impl Task<Network> for ContinuousDistillation {
    type Output = ProtocolResult;

    fn resume(
        &mut self,
        cx: &mut TaskContext<'_, Network>,
        _wake: &Wake,
    ) -> Result<Step<ProtocolResult>, ProtocolError> {
        match self.stage {
            Stage::Start => {
                info!(
                    correcting = %self.pair.correcting,
                    passive = %self.pair.passive,
                    "running initial entanglement establishment"
                );
                match self.begin_phase(cx, Phase::Initial)? {
                    Some(retry) => {
                        self.stage = Stage::Initial { retry };
                        Ok(Step::Wait(Condition::finished(retry)))
                    }
                    None => Ok(self.fail(SessionFailure::RouteUnavailable(format!(
                        "{} <-> {}",
                        self.pair.correcting, self.pair.passive
                    )))),
                }
            }
            Stage::Initial { retry } => {
                let outcome = self.end_phase(cx, retry)?;
                if !outcome.success {
                    // Sem par base não há o que destilar
                    let attempts = outcome.attempts();
                    let failure = outcome.failure.unwrap_or(SessionFailure::AttemptsExhausted {
                        phase: Phase::Initial,
                        attempts,
                    });
                    error!(%failure, "initial entanglement failed");
                    return Ok(self.fail(failure));
                }
                info!("swapping qubits into memory on both nodes");
                let condition = self.run_on_both(cx, Program::Swap)?;
                self.stage = Stage::Swapping;
                Ok(Step::Wait(condition))
            }
            Stage::Swapping => self.start_round(cx, 1),
            Stage::Round { round, retry } => {
                let outcome = self.end_phase(cx, retry)?;
                if !outcome.success {
                    let attempts = outcome.attempts();
                    let failure = outcome.failure.unwrap_or(SessionFailure::AttemptsExhausted {
                        phase: Phase::Distillation(round),
                        attempts,
                    });
                    if matches!(failure, SessionFailure::BadDiscriminator(_)) {
                        error!(round, %failure, "entanglement failed");
                        return Ok(self.fail(failure));
                    }
                    return self.round_failed(cx, round, failure);
                }
                info!(round, "running distillation");
                let condition = self.run_on_both(cx, Program::Distill)?;
                self.stage = Stage::Distilling { round };
                Ok(Step::Wait(condition))
            }
            Stage::Distilling { round } => {
                let pair = &self.pair;
                let outcomes = cx.act(|net, _| -> ProtoResult<(u8, u8)> {
                    let a = net.node_mut(&pair.correcting)?.take_measurement().unwrap_or(0);
                    let b = net.node_mut(&pair.passive)?.take_measurement().unwrap_or(0);
                    Ok((a, b))
                })?;
                info!(round, ?outcomes, "distillation results");
                if outcomes != DISTILLATION_TARGET {
                    return self.round_failed(cx, round, SessionFailure::DistillationMismatch { round, outcomes });
                }
                self.rounds_completed += 1;
                self.start_round(cx, round + 1)
            }
        }
    }

    fn label(&self) -> &'static str {
        "continuous-distillation"
    }
}
