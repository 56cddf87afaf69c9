//! Switch FSO com tabela de roteamento mutável

use std::collections::BTreeMap;

use fso_core::{DetectorConfig, NodeName, Signal, SimDuration, SwitchConfig};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::channel::{ChannelSet, Tier, attenuate};
use crate::error::{SwitchError, SwitchResult};
use crate::herald::HeraldUnit;
use crate::routing::{InPort, OutPort, PORT_COUNT, RoutingTable};

/// Fóton encaminhado a uma porta de saída
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relay {
    pub output: OutPort,
    /// Atraso do canal interno
    pub delay: SimDuration,
    pub signal: Signal,
    /// Fótons perdidos no caminho
    pub lost: u32,
}

/// Switch de três portas com unidade de heralding em `qout0`/`qout1`
#[derive(Debug)]
pub struct FsoSwitch {
    name: NodeName,
    routing: RoutingTable,
    registry: BTreeMap<NodeName, usize>,
    channels: ChannelSet,
    dampening: f64,
    herald: HeraldUnit,
}

impl FsoSwitch {
    pub fn new(name: NodeName, config: &SwitchConfig, detector: &DetectorConfig) -> SwitchResult<Self> {
        Ok(Self {
            name,
            routing: RoutingTable::identity(),
            registry: BTreeMap::new(),
            channels: ChannelSet::new(config),
            dampening: config.dampening,
            herald: HeraldUnit::new(detector)?,
        })
    }

    pub fn name(&self) -> &NodeName {
        &self.name
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn herald(&self) -> &HeraldUnit {
        &self.herald
    }

    pub fn herald_mut(&mut self) -> &mut HeraldUnit {
        &mut self.herald
    }

    /// Associa vizinho a uma porta local (feito na construção da topologia)
    pub fn register(&mut self, neighbor: NodeName, port: usize) -> SwitchResult<()> {
        if port >= PORT_COUNT {
            return Err(SwitchError::UnknownPort(format!("port {port}")));
        }
        debug!(switch = %self.name, %neighbor, port, "neighbour registered");
        self.registry.insert(neighbor, port);
        Ok(())
    }

    /// Porta local de um vizinho
    pub fn port_of(&self, neighbor: &NodeName) -> SwitchResult<usize> {
        self.registry
            .get(neighbor)
            .copied()
            .ok_or_else(|| SwitchError::UnknownNeighbor {
                switch: self.name.clone(),
                neighbor: neighbor.clone(),
            })
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (&NodeName, usize)> {
        self.registry.iter().map(|(name, port)| (name, *port))
    }

    /// Aplica tabela por nomes de porta
    ///
    /// Tabela inválida é rejeitada e a anterior permanece ativa.
    pub fn set_routing<I, A, B>(&mut self, entries: I) -> SwitchResult<()>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        match RoutingTable::from_names(entries) {
            Ok(table) => {
                self.install(table);
                Ok(())
            }
            Err(e) => {
                warn!(switch = %self.name, error = %e, "routing table rejected");
                Err(e)
            }
        }
    }

    /// Reinstala uma tabela já validada (desfaz comando anterior)
    pub fn restore_routing(&mut self, table: RoutingTable) {
        debug!(switch = %self.name, routing = %table, "routing table restored");
        self.routing = table;
    }

    fn install(&mut self, table: RoutingTable) {
        info!(switch = %self.name, routing = %table, "routing table applied");
        self.routing = table;
    }

    fn install_pairs(&mut self, pairs: Vec<(InPort, OutPort)>) -> SwitchResult<()> {
        match RoutingTable::from_pairs(pairs) {
            Ok(table) => {
                self.install(table);
                Ok(())
            }
            Err(e) => {
                warn!(switch = %self.name, error = %e, "routing table rejected");
                Err(e)
            }
        }
    }

    /// `a → qout0`, `b → qout1`, porta restante → `qout2`
    pub fn herald_switch(&mut self, a: &NodeName, b: &NodeName) -> SwitchResult<()> {
        let pa = self.port_of(a)?;
        let pb = self.port_of(b)?;
        let rest = (0..PORT_COUNT).find(|p| *p != pa && *p != pb).unwrap_or(pa);
        self.install_pairs(vec![
            (InPort::new(pa)?, OutPort::new(0)?),
            (InPort::new(pb)?, OutPort::new(1)?),
            (InPort::new(rest)?, OutPort::new(2)?),
        ])
    }

    /// Liga a entrada de `from` direto à saída de `to`; demais em ordem
    pub fn relay_switch(&mut self, from: &NodeName, to: &NodeName) -> SwitchResult<()> {
        let input = InPort::new(self.port_of(from)?)?;
        let output = OutPort::new(self.port_of(to)?)?;
        let mut pairs = vec![(input, output)];
        pairs.extend(
            InPort::all()
                .filter(|i| *i != input)
                .zip(OutPort::all().filter(|o| *o != output)),
        );
        self.install_pairs(pairs)
    }

    /// Volta à identidade
    pub fn default_routing(&mut self) {
        self.install(RoutingTable::identity());
    }

    /// Encaminha fóton recebido em `input` pelo canal interno correspondente
    pub fn route<R: Rng + ?Sized>(&self, rng: &mut R, input: InPort, mut signal: Signal) -> Relay {
        let output = self.routing.output(input);
        let channel = self.channels.get(Tier::between(input, output));
        let mut lost = channel.transmit(rng, &mut signal);
        lost += attenuate(rng, &mut signal, self.dampening);
        signal.header.outport = Some(output.index());
        debug!(switch = %self.name, %input, %output, lost, "photon relayed");
        Relay {
            output,
            delay: channel.delay(),
            signal,
            lost,
        }
    }
}

/// Acesso a switches por nome
pub trait SwitchFabric {
    fn switch_mut(&mut self, name: &NodeName) -> Option<&mut FsoSwitch>;

    /// Switch obrigatório
    fn require_switch(&mut self, name: &NodeName) -> SwitchResult<&mut FsoSwitch> {
        self.switch_mut(name)
            .ok_or_else(|| SwitchError::UnknownSwitch(name.clone()))
    }
}

impl SwitchFabric for BTreeMap<NodeName, FsoSwitch> {
    fn switch_mut(&mut self, name: &NodeName) -> Option<&mut FsoSwitch> {
        self.get_mut(name)
    }
}
