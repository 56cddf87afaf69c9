//! Canais de fibra internos do switch

use fso_core::{ChannelConfig, Signal, SimDuration, SwitchConfig};
use rand::Rng;

use crate::routing::{InPort, OutPort};

/// Caminho interno selecionado por `|in - out|`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Short,
    Mid,
    Long,
}

impl Tier {
    /// Camada física é função apenas da distância entre índices de porta
    pub fn between(input: InPort, output: OutPort) -> Self {
        match input.index().abs_diff(output.index()) {
            0 => Self::Short,
            1 => Self::Mid,
            _ => Self::Long,
        }
    }
}

/// Canal com perda e atraso
#[derive(Clone, Debug, PartialEq)]
pub struct FibreChannel {
    loss: f64,
    delay: SimDuration,
}

impl FibreChannel {
    pub fn new(config: &ChannelConfig) -> Self {
        Self {
            loss: config.loss_probability(),
            delay: config.delay(),
        }
    }

    pub fn loss_probability(&self) -> f64 {
        self.loss
    }

    pub fn delay(&self) -> SimDuration {
        self.delay
    }

    /// Aplica perda a cada modo; fóton perdido vira vácuo
    ///
    /// Devolve o número de fótons perdidos.
    pub fn transmit<R: Rng + ?Sized>(&self, rng: &mut R, signal: &mut Signal) -> u32 {
        attenuate(rng, signal, self.loss)
    }
}

/// Três canais do switch
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSet {
    short: FibreChannel,
    mid: FibreChannel,
    long: FibreChannel,
}

impl ChannelSet {
    pub fn new(config: &SwitchConfig) -> Self {
        Self {
            short: FibreChannel::new(&config.short),
            mid: FibreChannel::new(&config.mid),
            long: FibreChannel::new(&config.long),
        }
    }

    pub fn get(&self, tier: Tier) -> &FibreChannel {
        match tier {
            Tier::Short => &self.short,
            Tier::Mid => &self.mid,
            Tier::Long => &self.long,
        }
    }
}

/// Remove fótons presentes com probabilidade `p`
pub(crate) fn attenuate<R: Rng + ?Sized>(rng: &mut R, signal: &mut Signal, p: f64) -> u32 {
    if p <= 0.0 {
        return 0;
    }
    let mut lost = 0;
    for photon in signal.modes.iter_mut().flatten() {
        if !photon.is_vacuum() && rng.gen_bool(p.min(1.0)) {
            photon.lose();
            lost += 1;
        }
    }
    lost
}
