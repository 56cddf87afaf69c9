//! Portas e tabela de roteamento
//!
//! ```text
//!   qin0 ─┐           ┌─ qout0 ──▶ BSM lado 0
//!   qin1 ─┼─ tabela ──┼─ qout1 ──▶ BSM lado 1
//!   qin2 ─┘           └─ qout2 ──▶ link
//! ```

use std::fmt;
use std::str::FromStr;

use fso_core::Side;
use serde::{Deserialize, Serialize};

use crate::error::{SwitchError, SwitchResult};

/// Número de portas de entrada (e de saída)
pub const PORT_COUNT: usize = 3;

/// Porta de saída do link entre switches
pub const LINK_PORT: OutPort = OutPort(2);

/// Porta de entrada
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InPort(usize);

/// Porta de saída
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutPort(usize);

impl InPort {
    pub fn new(index: usize) -> SwitchResult<Self> {
        if index < PORT_COUNT {
            Ok(Self(index))
        } else {
            Err(SwitchError::UnknownPort(format!("qin{index}")))
        }
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = InPort> {
        (0..PORT_COUNT).map(InPort)
    }
}

impl OutPort {
    pub fn new(index: usize) -> SwitchResult<Self> {
        if index < PORT_COUNT {
            Ok(Self(index))
        } else {
            Err(SwitchError::UnknownPort(format!("qout{index}")))
        }
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = OutPort> {
        (0..PORT_COUNT).map(OutPort)
    }

    /// Lado do detector alimentado por esta porta
    pub fn herald_side(self) -> Option<Side> {
        Side::from_index(self.0)
    }

    pub fn for_side(side: Side) -> Self {
        Self(side.index())
    }
}

impl fmt::Display for InPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qin{}", self.0)
    }
}

impl fmt::Display for OutPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qout{}", self.0)
    }
}

fn parse_port(s: &str, prefix: &str) -> SwitchResult<usize> {
    s.strip_prefix(prefix)
        .and_then(|digits| digits.parse::<usize>().ok())
        .filter(|index| *index < PORT_COUNT)
        .ok_or_else(|| SwitchError::UnknownPort(s.to_string()))
}

impl FromStr for InPort {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port(s, "qin").map(Self)
    }
}

impl FromStr for OutPort {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_port(s, "qout").map(Self)
    }
}

/// Tabela de roteamento: bijeção entrada → saída
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    outputs: [OutPort; PORT_COUNT],
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::identity()
    }
}

impl RoutingTable {
    /// `qinK → qoutK`
    pub fn identity() -> Self {
        Self {
            outputs: [OutPort(0), OutPort(1), OutPort(2)],
        }
    }

    /// Valida pares e constrói a tabela
    ///
    /// Exige cada entrada exatamente uma vez e cada saída exatamente uma vez.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (InPort, OutPort)>) -> SwitchResult<Self> {
        let mut outputs: [Option<OutPort>; PORT_COUNT] = [None; PORT_COUNT];
        let mut used = [false; PORT_COUNT];
        for (input, output) in pairs {
            if outputs[input.0].is_some() {
                return Err(SwitchError::InvalidRoutingTable(format!(
                    "{input} mapped more than once"
                )));
            }
            if used[output.0] {
                return Err(SwitchError::InvalidRoutingTable(format!(
                    "{output} targeted more than once"
                )));
            }
            outputs[input.0] = Some(output);
            used[output.0] = true;
        }

        let mut table = [OutPort(0); PORT_COUNT];
        for (index, output) in outputs.into_iter().enumerate() {
            table[index] = output.ok_or_else(|| {
                SwitchError::InvalidRoutingTable(format!("qin{index} has no output"))
            })?;
        }
        Ok(Self { outputs: table })
    }

    /// Constrói a partir de nomes (`"qin0" → "qout2"`)
    pub fn from_names<I, A, B>(entries: I) -> SwitchResult<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let pairs = entries
            .into_iter()
            .map(|(a, b)| {
                let input = a.as_ref().parse::<InPort>();
                let output = b.as_ref().parse::<OutPort>();
                match (input, output) {
                    (Ok(i), Ok(o)) => Ok((i, o)),
                    (Err(e), _) | (_, Err(e)) => Err(SwitchError::InvalidRoutingTable(e.to_string())),
                }
            })
            .collect::<SwitchResult<Vec<_>>>()?;
        Self::from_pairs(pairs)
    }

    /// Saída associada à entrada
    pub fn output(&self, input: InPort) -> OutPort {
        self.outputs[input.0]
    }

    /// Entrada que alimenta a saída
    pub fn input_for(&self, output: OutPort) -> InPort {
        InPort::all()
            .find(|i| self.outputs[i.0] == output)
            .unwrap_or(InPort(output.0))
    }

    pub fn pairs(&self) -> impl Iterator<Item = (InPort, OutPort)> + '_ {
        InPort::all().map(|i| (i, self.outputs[i.0]))
    }

    /// Confere a invariante de bijeção
    pub fn is_bijection(&self) -> bool {
        let mut seen = [false; PORT_COUNT];
        for output in self.outputs {
            if seen[output.0] {
                return false;
            }
            seen[output.0] = true;
        }
        true
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.pairs().map(|(i, o)| format!("{i}->{o}")).collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
