//! Configuração da simulação (TOML)
//!
//! Todas as seções são opcionais; campos ausentes assumem os valores padrão
//! do simulador de referência (detector ideal, fibras internas curtas).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::message::Encoding;
use crate::types::SimDuration;

/// Velocidade da luz na fibra (km/s)
pub const FIBRE_C_KM_S: f64 = 200_000.0;

/// Parâmetros do detector BSM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Probabilidade de dark count por detector e janela
    pub p_dark: f64,
    /// Eficiência de detecção
    pub det_eff: f64,
    /// Indistinguibilidade dos fótons (HOM)
    pub visibility: f64,
    /// Detectores resolvem número de fótons
    pub num_resolving: bool,
    /// Janela de coincidência em ns
    pub coincidence_window_ns: u64,
    /// Reporta todos os modos com sucesso em vez do primeiro
    pub allow_multiple_successful_modes: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            p_dark: 0.0,
            det_eff: 1.0,
            visibility: 1.0,
            num_resolving: false,
            coincidence_window_ns: 300,
            allow_multiple_successful_modes: false,
        }
    }
}

impl DetectorConfig {
    pub fn coincidence_window(&self) -> SimDuration {
        SimDuration::from_nanos(self.coincidence_window_ns)
    }
}

/// Canal de fibra interno do switch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub length_km: f64,
    /// Perda fixa de inserção
    pub p_loss_init: f64,
    /// Atenuação em dB/km
    pub p_loss_length: f64,
    pub c_km_s: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            length_km: 0.005,
            p_loss_init: 0.0,
            p_loss_length: 0.0,
            c_km_s: FIBRE_C_KM_S,
        }
    }
}

impl ChannelConfig {
    pub fn with_length(length_km: f64) -> Self {
        Self {
            length_km,
            ..Self::default()
        }
    }

    /// Probabilidade total de perda do fóton
    pub fn loss_probability(&self) -> f64 {
        let transmitted =
            (1.0 - self.p_loss_init) * 10f64.powf(-self.length_km * self.p_loss_length / 10.0);
        (1.0 - transmitted).clamp(0.0, 1.0)
    }

    pub fn delay(&self) -> SimDuration {
        SimDuration::propagation(self.length_km, self.c_km_s)
    }
}

/// Parâmetros do switch FSO
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Caminho `|in - out| = 0`
    pub short: ChannelConfig,
    /// Caminho `|in - out| = 1`
    pub mid: ChannelConfig,
    /// Caminho `|in - out| = 2`
    pub long: ChannelConfig,
    /// Probabilidade extra de amortecer o fóton a cada passagem
    pub dampening: f64,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            short: ChannelConfig::with_length(0.005),
            mid: ChannelConfig::with_length(0.00587),
            long: ChannelConfig::with_length(0.00756),
            dampening: 0.0,
        }
    }
}

/// Atrasos da rede em ns
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fibra endpoint → switch
    pub endpoint_link_ns: u64,
    /// Fibra switch → switch
    pub switch_link_ns: u64,
    /// Canal clássico (switch → controle → endpoint)
    pub classical_ns: u64,
    /// Timeout de uma tentativa
    pub attempt_timeout_ns: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            endpoint_link_ns: 5,
            switch_link_ns: 25,
            classical_ns: 10,
            attempt_timeout_ns: 1000,
        }
    }
}

impl TimingConfig {
    pub fn endpoint_link(&self) -> SimDuration {
        SimDuration::from_nanos(self.endpoint_link_ns)
    }

    pub fn switch_link(&self) -> SimDuration {
        SimDuration::from_nanos(self.switch_link_ns)
    }

    pub fn classical(&self) -> SimDuration {
        SimDuration::from_nanos(self.classical_ns)
    }

    pub fn attempt_timeout(&self) -> SimDuration {
        SimDuration::from_nanos(self.attempt_timeout_ns)
    }
}

/// Política para rodada de destilação malsucedida
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundFailurePolicy {
    /// Encerra a sessão na primeira rodada falha
    #[default]
    Abort,
    /// Conta a falha e segue para a próxima rodada
    Continue,
}

/// Orçamentos do protocolo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub max_attempts: u32,
    pub max_rounds: u32,
    pub round_failure: RoundFailurePolicy,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_rounds: 3,
            round_failure: RoundFailurePolicy::Abort,
        }
    }
}

/// Backend quântico abstrato
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub encoding: Encoding,
    pub emit_ns: u64,
    pub correction_ns: u64,
    pub swap_ns: u64,
    pub distill_ns: u64,
    /// Probabilidade de a fonte emitir um fóton
    pub emission_probability: f64,
    /// Probabilidade de a medição de destilação resultar em 1
    pub distillation_success_probability: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            encoding: Encoding::PresenceAbsence,
            emit_ns: 1,
            correction_ns: 1,
            swap_ns: 1,
            distill_ns: 11,
            emission_probability: 1.0,
            distillation_success_probability: 1.0,
        }
    }
}

/// Nó de controle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Máximo de requisições mantidas na tabela pendente
    pub pending_capacity: usize,
    /// Idade máxima de uma requisição em ns
    pub request_ttl_ns: Option<u64>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            pending_capacity: 1024,
            request_ttl_ns: None,
        }
    }
}

/// Configuração completa da simulação
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub detector: DetectorConfig,
    pub switch: SwitchConfig,
    pub timing: TimingConfig,
    pub protocol: ProtocolConfig,
    pub backend: BackendConfig,
    pub control: ControlConfig,
    /// Semente do gerador
    pub seed: u64,
    /// Orçamento de eventos do kernel por execução
    pub max_events: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            switch: SwitchConfig::default(),
            timing: TimingConfig::default(),
            protocol: ProtocolConfig::default(),
            backend: BackendConfig::default(),
            control: ControlConfig::default(),
            seed: 0,
            max_events: 1_000_000,
        }
    }
}

impl SimulationConfig {
    /// Parse e validação a partir de TOML
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Lê arquivo TOML
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serializa para TOML
    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    /// Valida faixas de probabilidades e orçamentos
    pub fn validate(&self) -> CoreResult<()> {
        let probabilities = [
            ("detector.p_dark", self.detector.p_dark),
            ("detector.det_eff", self.detector.det_eff),
            ("detector.visibility", self.detector.visibility),
            ("switch.dampening", self.switch.dampening),
            ("switch.short.p_loss_init", self.switch.short.p_loss_init),
            ("switch.mid.p_loss_init", self.switch.mid.p_loss_init),
            ("switch.long.p_loss_init", self.switch.long.p_loss_init),
            ("backend.emission_probability", self.backend.emission_probability),
            (
                "backend.distillation_success_probability",
                self.backend.distillation_success_probability,
            ),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }

        for (name, channel) in [
            ("short", &self.switch.short),
            ("mid", &self.switch.mid),
            ("long", &self.switch.long),
        ] {
            if channel.length_km < 0.0 || channel.p_loss_length < 0.0 || channel.c_km_s <= 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "switch.{name} channel has negative length/attenuation or non-positive speed"
                )));
            }
        }

        if self.detector.coincidence_window_ns == 0 {
            return Err(CoreError::InvalidConfig(
                "detector.coincidence_window_ns must be non-zero".into(),
            ));
        }
        if self.timing.attempt_timeout_ns == 0 {
            return Err(CoreError::InvalidConfig(
                "timing.attempt_timeout_ns must be non-zero".into(),
            ));
        }
        if self.protocol.max_attempts == 0 {
            return Err(CoreError::InvalidConfig(
                "protocol.max_attempts must be non-zero".into(),
            ));
        }
        if self.control.pending_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "control.pending_capacity must be non-zero".into(),
            ));
        }
        if self.max_events == 0 {
            return Err(CoreError::InvalidConfig("max_events must be non-zero".into()));
        }
        Ok(())
    }
}
