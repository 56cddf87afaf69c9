//! # Bell States — Índices de Bell e Resultados de Medição
//!
//! O detector BSM projeta o par de fótons num dos quatro estados de Bell.
//! Apenas Ψ+ e Ψ- são distinguíveis com óptica linear; o fio carrega o
//! índice do estado ou `-1` quando não houve emaranhamento.
//!
//! ```text
//! |Φ+⟩ = (|00⟩ + |11⟩) / √2   → 0
//! |Ψ+⟩ = (|01⟩ + |10⟩) / √2   → 1  (correção A)
//! |Ψ-⟩ = (|01⟩ - |10⟩) / √2   → 2  (correção B)
//! |Φ-⟩ = (|00⟩ - |11⟩) / √2   → 3
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminador de fio que indica ausência de emaranhamento
pub const NO_ENTANGLEMENT: i8 = -1;

/// Estado de Bell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BellIndex {
    /// |Φ+⟩ = (|00⟩ + |11⟩) / √2
    PhiPlus = 0,
    /// |Ψ+⟩ = (|01⟩ + |10⟩) / √2
    PsiPlus = 1,
    /// |Ψ-⟩ = (|01⟩ - |10⟩) / √2
    PsiMinus = 2,
    /// |Φ-⟩ = (|00⟩ - |11⟩) / √2
    PhiMinus = 3,
}

impl BellIndex {
    /// Índice usado no fio
    pub fn index(self) -> i8 {
        self as i8
    }

    /// Converte índice de fio; valores fora de 0..=3 não são estados de Bell
    pub fn from_index(index: i8) -> Option<Self> {
        match index {
            0 => Some(Self::PhiPlus),
            1 => Some(Self::PsiPlus),
            2 => Some(Self::PsiMinus),
            3 => Some(Self::PhiMinus),
            _ => None,
        }
    }

    /// Correção local que o endpoint corretor deve aplicar
    pub fn correction(self) -> Option<Correction> {
        match self {
            Self::PsiPlus => Some(Correction::A),
            Self::PsiMinus => Some(Correction::B),
            Self::PhiPlus | Self::PhiMinus => None,
        }
    }

    /// Nome descritivo
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhiPlus => "Φ+",
            Self::PsiPlus => "Ψ+",
            Self::PsiMinus => "Ψ-",
            Self::PhiMinus => "Φ-",
        }
    }
}

impl fmt::Display for BellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operação local de correção
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correction {
    /// Correção para Ψ+
    A,
    /// Correção para Ψ-
    B,
}

/// Resultado de um evento de medição do detector
///
/// `bell` é `None` se e somente se `success` é falso.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionOutcome {
    success: bool,
    bell: Option<BellIndex>,
    mode: Option<usize>,
}

impl DetectionOutcome {
    /// Sucesso com estado de Bell projetado e modo opcional
    pub fn success(bell: BellIndex, mode: Option<usize>) -> Self {
        Self {
            success: true,
            bell: Some(bell),
            mode,
        }
    }

    /// Falha (sem click válido)
    pub fn failure() -> Self {
        Self {
            success: false,
            bell: None,
            mode: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn bell(&self) -> Option<BellIndex> {
        self.bell
    }

    pub fn mode(&self) -> Option<usize> {
        self.mode
    }

    /// Discriminador de fio (`-1` em falha)
    pub fn wire(&self) -> i8 {
        self.bell.map(BellIndex::index).unwrap_or(NO_ENTANGLEMENT)
    }
}
