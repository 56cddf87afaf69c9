//! Sinais quânticos e mensagens clássicas trocadas na rede

use serde::{Deserialize, Serialize};

use crate::bell::{DetectionOutcome, NO_ENTANGLEMENT};
use crate::types::{NodeName, RequestId};

/// Codificação do qubit fotônico
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// Presença ou ausência de fóton
    PresenceAbsence,
    /// Fóton em bin temporal cedo ou tarde
    TimeBin,
}

/// Bin temporal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBin {
    Early,
    Late,
}

/// Conteúdo de um modo do canal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photon {
    /// Número de fótons (0 = vácuo)
    pub count: u8,
    /// Bin ocupado (somente codificação time-bin)
    pub bin: Option<TimeBin>,
}

impl Photon {
    pub fn present() -> Self {
        Self { count: 1, bin: None }
    }

    pub fn vacuum() -> Self {
        Self { count: 0, bin: None }
    }

    pub fn in_bin(bin: TimeBin) -> Self {
        Self {
            count: 1,
            bin: Some(bin),
        }
    }

    pub fn is_vacuum(&self) -> bool {
        self.count == 0
    }

    /// Perde o fóton, mantendo o modo como vácuo
    pub fn lose(&mut self) {
        self.count = 0;
        self.bin = None;
    }
}

/// Metadados de roteamento anexados ao sinal
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Requisição que originou a emissão
    pub request: Option<RequestId>,
    /// Endpoint emissor
    pub origin: Option<NodeName>,
    /// Porta de saída escolhida pelo último switch
    pub outport: Option<usize>,
    /// Sequência (única na rede) da emissão que gerou o fóton
    pub emission: Option<u64>,
}

/// Sinal fotônico multi-modo
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub encoding: Encoding,
    /// Um item por modo; `None` é um modo sem qubit associado
    pub modes: Vec<Option<Photon>>,
    pub header: Header,
}

impl Signal {
    /// Sinal de modo único
    pub fn single(encoding: Encoding, photon: Photon) -> Self {
        Self {
            encoding,
            modes: vec![Some(photon)],
            header: Header::default(),
        }
    }

    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    /// Quantidade de fótons presentes em todos os modos
    pub fn photon_count(&self) -> u32 {
        self.modes.iter().flatten().map(|p| u32::from(p.count)).sum()
    }
}

/// Resultado de heralding no fio clássico
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heralding {
    /// Índice de Bell ou `-1`
    pub discriminator: i8,
    pub mode: Option<usize>,
}

impl From<DetectionOutcome> for Heralding {
    fn from(outcome: DetectionOutcome) -> Self {
        Self {
            discriminator: outcome.wire(),
            mode: outcome.mode(),
        }
    }
}

impl Heralding {
    pub fn no_entanglement() -> Self {
        Self {
            discriminator: NO_ENTANGLEMENT,
            mode: None,
        }
    }
}

/// Mensagem de correção: switch → controle → endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionMessage {
    pub request: Option<RequestId>,
    /// `None` representa payload ausente
    pub payload: Option<Heralding>,
    /// Emissões medidas na janela, por lado do detector
    #[serde(default)]
    pub emissions: [Option<u64>; 2],
}

impl CorrectionMessage {
    pub fn new(request: Option<RequestId>, payload: Heralding) -> Self {
        Self {
            request,
            payload: Some(payload),
            emissions: [None; 2],
        }
    }

    /// Mensagem sem payload (anomalia de transporte)
    pub fn empty(request: Option<RequestId>) -> Self {
        Self {
            request,
            payload: None,
            emissions: [None; 2],
        }
    }

    pub fn with_emissions(mut self, emissions: [Option<u64>; 2]) -> Self {
        self.emissions = emissions;
        self
    }

    /// Carrega a sequência de alguma emissão
    pub fn is_tagged(&self) -> bool {
        self.emissions.iter().any(Option::is_some)
    }

    /// A mensagem responde à emissão `emission`?
    ///
    /// Mensagens sem etiqueta não são correlacionáveis e valem para qualquer
    /// emissão; etiquetadas só valem para a emissão que mediram.
    pub fn answers(&self, emission: Option<u64>) -> bool {
        match emission {
            Some(id) if self.is_tagged() => self.emissions.contains(&Some(id)),
            _ => true,
        }
    }
}
