//! Colaborador quântico: duração e efeito dos programas locais
//!
//! O estado quântico em si não é modelado aqui. O backend decide se a
//! emissão produz fóton e qual bit a medição da destilação devolve.

use std::fmt;

use fso_core::{BackendConfig, Correction, Encoding, NodeName, Photon, Signal, SimDuration, TimeBin};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::trace;

/// Programa executado no processador de um endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Inicializa o qubit de comunicação e emite o fóton
    Emit,
    /// Correção local após heralding
    Correct(Correction),
    /// Move o par para o slot protegido
    Swap,
    /// CNOT memória → fresco e medição do alvo
    Distill,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emit => write!(f, "emit"),
            Self::Correct(Correction::A) => write!(f, "correct_a"),
            Self::Correct(Correction::B) => write!(f, "correct_b"),
            Self::Swap => write!(f, "swap"),
            Self::Distill => write!(f, "distill"),
        }
    }
}

/// Contrato do simulador quântico consumido pela rede
pub trait QuantumBackend: fmt::Debug {
    /// Duração de um programa
    fn duration(&self, program: Program) -> SimDuration;

    /// Sinal emitido ao fim do programa [`Program::Emit`]
    fn emit(&mut self, rng: &mut StdRng, node: &NodeName) -> Signal;

    /// Efeito de conclusão; [`Program::Distill`] devolve o bit medido
    fn complete(&mut self, rng: &mut StdRng, node: &NodeName, program: Program) -> Option<u8>;
}

/// Backend abstrato parametrizado por probabilidades
#[derive(Debug, Clone)]
pub struct AbstractBackend {
    config: BackendConfig,
}

impl AbstractBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl Default for AbstractBackend {
    fn default() -> Self {
        Self::new(BackendConfig::default())
    }
}

impl QuantumBackend for AbstractBackend {
    fn duration(&self, program: Program) -> SimDuration {
        let nanos = match program {
            Program::Emit => self.config.emit_ns,
            Program::Correct(_) => self.config.correction_ns,
            Program::Swap => self.config.swap_ns,
            Program::Distill => self.config.distill_ns,
        };
        SimDuration::from_nanos(nanos)
    }

    fn emit(&mut self, rng: &mut StdRng, node: &NodeName) -> Signal {
        let emitted = rng.gen_bool(self.config.emission_probability);
        let photon = match (emitted, self.config.encoding) {
            (false, _) => Photon::vacuum(),
            (true, Encoding::PresenceAbsence) => Photon::present(),
            (true, Encoding::TimeBin) => {
                let bin = if rng.gen_bool(0.5) { TimeBin::Early } else { TimeBin::Late };
                Photon::in_bin(bin)
            }
        };
        trace!(%node, emitted, "photon emitted");
        Signal::single(self.config.encoding, photon)
    }

    fn complete(&mut self, rng: &mut StdRng, node: &NodeName, program: Program) -> Option<u8> {
        match program {
            Program::Distill => {
                let bit = u8::from(rng.gen_bool(self.config.distillation_success_probability));
                trace!(%node, bit, "distillation target measured");
                Some(bit)
            }
            _ => None,
        }
    }
}
