//! Modelo de clicks do divisor de feixe
//!
//! Dois detectores (D0, D1) atrás de um beamsplitter 50:50. Para cada modo:
//!
//! ```text
//! fóton ──▶ det_eff ──▶ HOM (1+V)/2 ──▶ D0 | D1 ──▶ + dark counts
//! ```
//!
//! Presença/ausência: exatamente um detector com click é sucesso
//! (D0 → Ψ+, D1 → Ψ-). Time-bin: exatamente um click em cada bin; mesmo
//! detector nos dois bins → Ψ+, detectores diferentes → Ψ-.

use fso_core::{BellIndex, DetectionOutcome, DetectorConfig, Encoding, Photon, Signal, TimeBin};
use rand::Rng;

use crate::error::{DetectorError, DetectorResult};

/// Parâmetros validados do detector
#[derive(Clone, Debug, PartialEq)]
pub struct ClickModel {
    p_dark: f64,
    det_eff: f64,
    visibility: f64,
    num_resolving: bool,
    allow_multiple_successful_modes: bool,
}

impl ClickModel {
    /// Valida os parâmetros da configuração
    pub fn new(config: &DetectorConfig) -> DetectorResult<Self> {
        for (name, value) in [
            ("p_dark", config.p_dark),
            ("det_eff", config.det_eff),
            ("visibility", config.visibility),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectorError::InvalidParameter { name, value });
            }
        }
        Ok(Self {
            p_dark: config.p_dark,
            det_eff: config.det_eff,
            visibility: config.visibility,
            num_resolving: config.num_resolving,
            allow_multiple_successful_modes: config.allow_multiple_successful_modes,
        })
    }

    /// Detector ideal
    pub fn ideal() -> Self {
        Self {
            p_dark: 0.0,
            det_eff: 1.0,
            visibility: 1.0,
            num_resolving: false,
            allow_multiple_successful_modes: false,
        }
    }

    /// Mede um evento com duas entradas presentes
    ///
    /// Devolve a lista de resultados por modo; em falha, um único resultado
    /// sem modo.
    pub fn measure<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        left: &Signal,
        right: &Signal,
    ) -> DetectorResult<Vec<DetectionOutcome>> {
        if left.encoding != right.encoding {
            return Err(DetectorError::MixedEncoding {
                left: left.encoding,
                right: right.encoding,
            });
        }
        if left.modes.len() != right.modes.len() {
            return Err(DetectorError::ModeCountMismatch {
                left: left.modes.len(),
                right: right.modes.len(),
            });
        }

        let mut successes = Vec::new();
        for (mode, (l, r)) in left.modes.iter().zip(&right.modes).enumerate() {
            let bell = match left.encoding {
                Encoding::PresenceAbsence => self.presence_absence(rng, *l, *r),
                Encoding::TimeBin => self.time_bin(rng, mode, *l, *r)?,
            };
            if let Some(bell) = bell {
                successes.push(DetectionOutcome::success(bell, Some(mode)));
                if !self.allow_multiple_successful_modes {
                    break;
                }
            }
        }

        if successes.is_empty() {
            successes.push(DetectionOutcome::failure());
        }
        Ok(successes)
    }

    fn presence_absence<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        left: Option<Photon>,
        right: Option<Photon>,
    ) -> Option<BellIndex> {
        let n_left = self.detected(rng, left);
        let n_right = self.detected(rng, right);
        let mut counts = self.split(rng, n_left, n_right);
        for count in counts.iter_mut() {
            if rng.gen_bool(self.p_dark) {
                *count += 1;
            }
        }
        self.herald(counts).map(|detector| match detector {
            0 => BellIndex::PsiPlus,
            _ => BellIndex::PsiMinus,
        })
    }

    fn time_bin<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        mode: usize,
        left: Option<Photon>,
        right: Option<Photon>,
    ) -> DetectorResult<Option<BellIndex>> {
        // bins[bin][detector]
        let mut bins = [[0u32; 2]; 2];
        for bin in [TimeBin::Early, TimeBin::Late] {
            let n_left = self.detected(rng, in_bin(mode, left, bin)?);
            let n_right = self.detected(rng, in_bin(mode, right, bin)?);
            let slot = bin_index(bin);
            bins[slot] = self.split(rng, n_left, n_right);
            for count in bins[slot].iter_mut() {
                if rng.gen_bool(self.p_dark) {
                    *count += 1;
                }
            }
        }

        let early = self.herald(bins[0]);
        let late = self.herald(bins[1]);
        Ok(match (early, late) {
            (Some(e), Some(l)) if e == l => Some(BellIndex::PsiPlus),
            (Some(_), Some(_)) => Some(BellIndex::PsiMinus),
            _ => None,
        })
    }

    /// Fótons que sobrevivem à eficiência de detecção
    fn detected<R: Rng + ?Sized>(&self, rng: &mut R, photon: Option<Photon>) -> u32 {
        let Some(photon) = photon else {
            return 0;
        };
        (0..photon.count).filter(|_| rng.gen_bool(self.det_eff)).count() as u32
    }

    /// Distribui os fótons entre D0 e D1
    fn split<R: Rng + ?Sized>(&self, rng: &mut R, n_left: u32, n_right: u32) -> [u32; 2] {
        let mut counts = [0u32; 2];
        let pairs = n_left.min(n_right);
        let bunching = (1.0 + self.visibility) / 2.0;
        for _ in 0..pairs {
            if rng.gen_bool(bunching) {
                counts[usize::from(rng.gen_bool(0.5))] += 2;
            } else {
                counts[0] += 1;
                counts[1] += 1;
            }
        }
        for _ in 0..(n_left.max(n_right) - pairs) {
            counts[usize::from(rng.gen_bool(0.5))] += 1;
        }
        counts
    }

    /// Detector que anunciou sucesso, se houver exatamente um
    fn herald(&self, counts: [u32; 2]) -> Option<usize> {
        if self.num_resolving {
            match counts {
                [1, 0] => Some(0),
                [0, 1] => Some(1),
                _ => None,
            }
        } else {
            match (counts[0] > 0, counts[1] > 0) {
                (true, false) => Some(0),
                (false, true) => Some(1),
                _ => None,
            }
        }
    }
}

fn bin_index(bin: TimeBin) -> usize {
    match bin {
        TimeBin::Early => 0,
        TimeBin::Late => 1,
    }
}

/// Fóton do modo restrito ao bin pedido
fn in_bin(mode: usize, photon: Option<Photon>, bin: TimeBin) -> DetectorResult<Option<Photon>> {
    match photon {
        Some(p) if p.is_vacuum() => Ok(None),
        Some(p) => match p.bin {
            Some(b) if b == bin => Ok(Some(p)),
            Some(_) => Ok(None),
            None => Err(DetectorError::MissingTimeBin(mode)),
        },
        None => Ok(None),
    }
}
