//! Tentativa única de emaranhamento (por endpoint)
//!
//! ```text
//! Idle ──flush + emit──▶ AwaitingCorrection ──┬─ timer ─────────▶ TimedOut
//!                                             ├─ sem payload ───▶ MalformedMessage
//!                                             ├─ -1 ────────────▶ NoEntanglement
//!                                             ├─ 1 | 2 ─(corretor)─▶ Correcting ─▶ Corrected
//!                                             │        └(passivo)──────────────────▶ Accepted
//!                                             └─ outro ─────────▶ BadDiscriminator
//! ```
//!
//! Correções etiquetadas com outra emissão chegaram tarde para uma tentativa
//! anterior: são descartadas e a espera continua até o timer.

use std::fmt;

use fso_core::{BellIndex, CorrectionMessage, NO_ENTANGLEMENT, NodeName, SimDuration};
use fso_sim::{Condition, Step, Task, TaskContext, TimerId, Wake};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::backend::Program;
use crate::error::{ProtoResult, ProtocolError};
use crate::network::Network;
use crate::node::Party;

/// Resultado terminal de uma tentativa
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Correção local aplicada
    Corrected,
    /// Parte passiva aceitou o estado
    Accepted,
    NoEntanglement,
    /// Mensagem sem payload
    MalformedMessage,
    /// Discriminador fora do contrato detector/protocolo
    BadDiscriminator(i8),
    TimedOut,
}

impl AttemptStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Corrected | Self::Accepted)
    }

    /// Falha recuperável pelo laço de retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoEntanglement | Self::MalformedMessage | Self::TimedOut)
    }

    /// Motivo registrado na trilha de auditoria
    pub fn log(&self) -> String {
        match self {
            Self::Corrected | Self::Accepted => "corrected".into(),
            Self::NoEntanglement => "no entanglement".into(),
            Self::MalformedMessage => "no_msg".into(),
            Self::BadDiscriminator(value) => format!("bad state:{value}"),
            Self::TimedOut => "timeout".into(),
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log())
    }
}

/// Saída da tarefa de tentativa
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub node: NodeName,
    pub party: Party,
    pub status: AttemptStatus,
}

impl AttemptOutcome {
    pub fn success(&self) -> bool {
        self.status.is_success()
    }

    pub fn log(&self) -> String {
        self.status.log()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    /// Processador ocupado com programa anterior
    Draining,
    AwaitingCorrection { timer: TimerId },
    Correcting,
    Finished,
}

/// Máquina de estados de uma tentativa num endpoint
#[derive(Debug)]
pub struct EntanglementAttempt {
    node: NodeName,
    party: Party,
    timeout: SimDuration,
    stage: Stage,
    /// Sequência da emissão desta tentativa
    emission: Option<u64>,
}

impl EntanglementAttempt {
    pub fn new(node: NodeName, party: Party, timeout: SimDuration) -> Self {
        Self {
            node,
            party,
            timeout,
            stage: Stage::Idle,
            emission: None,
        }
    }

    pub fn node(&self) -> &NodeName {
        &self.node
    }

    fn finish(&mut self, status: AttemptStatus) -> Step<AttemptOutcome> {
        self.stage = Stage::Finished;
        Step::Done(AttemptOutcome {
            node: self.node.clone(),
            party: self.party,
            status,
        })
    }

    fn emit(&mut self, cx: &mut TaskContext<'_, Network>) -> ProtoResult<Step<AttemptOutcome>> {
        let node = &self.node;
        let (stale, emission) = cx.act(|net, wcx| -> ProtoResult<(usize, Option<u64>)> {
            let stale = net.node_mut(node)?.flush_inbox();
            net.start_program(wcx, node, Program::Emit)?;
            Ok((stale, net.node(node)?.emission()))
        })?;
        self.emission = emission;
        if stale > 0 {
            debug!(node = %self.node, stale, "stale corrections flushed");
        }

        let timer = cx.start_timer(self.timeout);
        self.stage = Stage::AwaitingCorrection { timer };
        Ok(Step::Wait(Condition::any([
            Condition::all([
                Condition::program(self.node.clone()),
                Condition::inbox(self.node.clone()),
            ]),
            Condition::timer(timer),
        ])))
    }

    /// Primeira mensagem que responde a esta emissão; descarta as demais
    fn next_message(&self, cx: &mut TaskContext<'_, Network>) -> ProtoResult<(Option<CorrectionMessage>, usize)> {
        let node = &self.node;
        let emission = self.emission;
        cx.act(|net, _| {
            let qpu = net.node_mut(node)?;
            let mut stale = 0;
            while let Some(message) = qpu.pop_message() {
                if message.answers(emission) {
                    return Ok((Some(message), stale));
                }
                stale += 1;
            }
            Ok((None, stale))
        })
    }

    fn on_correction(
        &mut self,
        cx: &mut TaskContext<'_, Network>,
        timer: TimerId,
    ) -> ProtoResult<Step<AttemptOutcome>> {
        let (message, stale) = self.next_message(cx)?;
        if stale > 0 {
            debug!(node = %self.node, stale, emission = ?self.emission, "late corrections discarded");
            if message.is_none() {
                // Só correções de emissões anteriores: continua esperando
                return Ok(Step::Wait(Condition::any([
                    Condition::inbox(self.node.clone()),
                    Condition::timer(timer),
                ])));
            }
        }

        let node = &self.node;
        let Some(heralding) = message.and_then(|m| m.payload) else {
            warn!(node = %self.node, party = %self.party, "correction message without payload");
            return Ok(self.finish(AttemptStatus::MalformedMessage));
        };

        let discriminator = heralding.discriminator;
        if discriminator == NO_ENTANGLEMENT {
            info!(node = %self.node, party = %self.party, "invalid entanglement");
            return Ok(self.finish(AttemptStatus::NoEntanglement));
        }

        let correction = BellIndex::from_index(discriminator).and_then(BellIndex::correction);
        let Some(correction) = correction else {
            error!(node = %self.node, party = %self.party, discriminator, "bad state");
            return Ok(self.finish(AttemptStatus::BadDiscriminator(discriminator)));
        };

        info!(node = %self.node, party = %self.party, discriminator, "processing Bell state");
        match self.party {
            Party::Correcting => {
                cx.act(|net, wcx| net.start_program(wcx, node, Program::Correct(correction)))?;
                self.stage = Stage::Correcting;
                Ok(Step::Wait(Condition::program(self.node.clone())))
            }
            Party::Passive => Ok(self.finish(AttemptStatus::Accepted)),
        }
    }
}

impl Task<Network> for EntanglementAttempt {
    type Output = AttemptOutcome;

    fn resume(
        &mut self,
        cx: &mut TaskContext<'_, Network>,
        wake: &Wake,
    ) -> Result<Step<AttemptOutcome>, ProtocolError> {
        match self.stage {
            Stage::Idle => {
                if cx.world().node(&self.node)?.is_busy() {
                    self.stage = Stage::Draining;
                    return Ok(Step::Wait(Condition::program(self.node.clone())));
                }
                self.emit(cx)
            }
            Stage::Draining => self.emit(cx),
            Stage::AwaitingCorrection { timer } => {
                // Timeout tem precedência sobre mensagem simultânea
                if wake.timer_fired(timer) {
                    info!(node = %self.node, party = %self.party, "ebit establishment timeout");
                    return Ok(self.finish(AttemptStatus::TimedOut));
                }
                self.on_correction(cx, timer)
            }
            Stage::Correcting => Ok(self.finish(AttemptStatus::Corrected)),
            Stage::Finished => Err(ProtocolError::Sim(fso_sim::SimError::Reentrant(cx.current()))),
        }
    }

    fn label(&self) -> &'static str {
        "entanglement-attempt"
    }
}
