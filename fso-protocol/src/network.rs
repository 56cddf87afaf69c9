//! Rede simulada: endpoints, switches, links e nó de controle
//!
//! ```text
//! qnode ──fibra──▶ switch ──link (qout2)──▶ switch ... ──▶ BSM
//!   ▲                                                     │ cout
//!   └──────────── controle ◀──────────── correção ◀───────┘
//! ```

use std::collections::BTreeMap;

use fso_control::{ControlNode, Role, Topology};
use fso_core::{
    AttemptRecord, CorrectionMessage, Header, NodeName, RequestId, Side, Signal, SimTime, SimulationConfig,
    TimingConfig,
};
use fso_sim::{Trigger, World, WorldContext};
use fso_switch::{FsoSwitch, InPort, LINK_PORT};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::backend::{AbstractBackend, Program, QuantumBackend};
use crate::error::{ProtoResult, ProtocolError};
use crate::node::{EndpointPair, Party, QpuNode};

/// Nome do nó de controle
pub const CONTROL_NODE: &str = "control";

/// Eventos da rede
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetEvent {
    /// Fóton chega numa porta de entrada de switch
    Photon {
        switch: NodeName,
        port: usize,
        signal: Signal,
    },
    /// Fóton chega num lado do detector
    Herald {
        switch: NodeName,
        side: Side,
        signal: Signal,
    },
    /// Expiração de janela de coincidência
    WindowClose { switch: NodeName, window_id: u64 },
    /// Mensagem na entrada do controle
    ControlInbox(CorrectionMessage),
    /// Mensagem na entrada de correções de um endpoint
    EndpointInbox {
        node: NodeName,
        message: CorrectionMessage,
    },
    /// Programa local concluído
    ProgramDone { node: NodeName, program: Program },
}

/// Contadores de tráfego
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub photons_emitted: u64,
    /// Fótons que saíram por porta sem link
    pub photons_dropped: u64,
    pub corrections_relayed: u64,
    /// Correções sem requisição correspondente
    pub corrections_dropped: u64,
}

/// Mundo simulado
#[derive(Debug)]
pub struct Network {
    config: SimulationConfig,
    control: ControlNode,
    switches: BTreeMap<NodeName, FsoSwitch>,
    nodes: BTreeMap<NodeName, QpuNode>,
    /// endpoint → (switch, porta)
    attachments: BTreeMap<NodeName, (NodeName, usize)>,
    /// (switch, qout) → (switch, qin)
    links: BTreeMap<(NodeName, usize), (NodeName, usize)>,
    backend: Box<dyn QuantumBackend>,
    rng: StdRng,
    stats: NetworkStats,
    /// Última sequência de emissão atribuída
    emissions: u64,
    /// Trilha de auditoria da execução corrente
    history: Vec<AttemptRecord>,
}

impl Network {
    /// Um switch, dois endpoints com os nomes dados
    pub fn simple(config: SimulationConfig, a: NodeName, b: NodeName) -> ProtoResult<Self> {
        Self::build(config, Topology::Simple, vec![a, b])
    }

    /// Anel de `switches` switches com dois endpoints cada
    pub fn ring(config: SimulationConfig, switches: usize) -> ProtoResult<Self> {
        let topology = Topology::Ring { switches };
        let endpoints = (0..topology.endpoint_count()).map(NodeName::endpoint).collect();
        Self::build(config, topology, endpoints)
    }

    /// Árvore de `branches` ramos de `branch_size` endpoints
    pub fn tree(config: SimulationConfig, branches: usize, branch_size: usize) -> ProtoResult<Self> {
        let topology = Topology::Tree {
            branches,
            branch_size,
        };
        let endpoints = (0..topology.endpoint_count()).map(NodeName::endpoint).collect();
        Self::build(config, topology, endpoints)
    }

    /// Constrói a rede para a topologia, nomeando os endpoints em ordem de índice
    pub fn build(config: SimulationConfig, topology: Topology, endpoints: Vec<NodeName>) -> ProtoResult<Self> {
        config.validate()?;
        topology.validate()?;
        if endpoints.len() != topology.endpoint_count() {
            return Err(ProtocolError::InvalidTopology(format!(
                "{topology:?} serves {} endpoints, got {}",
                topology.endpoint_count(),
                endpoints.len()
            )));
        }

        let control = ControlNode::new(
            NodeName::from(CONTROL_NODE),
            topology,
            &config.control,
            config.seed.wrapping_add(1),
        )?;
        let mut network = Self {
            backend: Box::new(AbstractBackend::new(config.backend.clone())),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            control,
            switches: BTreeMap::new(),
            nodes: BTreeMap::new(),
            attachments: BTreeMap::new(),
            links: BTreeMap::new(),
            stats: NetworkStats::default(),
            emissions: 0,
            history: Vec::new(),
        };

        let mut roles = Vec::new();
        for index in 0..topology.switch_count() {
            let name = NodeName::switch(index);
            let switch = FsoSwitch::new(name.clone(), &network.config.switch, &network.config.detector)?;
            network.switches.insert(name.clone(), switch);
            roles.push((name, Role::Switch { index }));
        }

        for (index, name) in endpoints.into_iter().enumerate() {
            let (switch, port) = topology.attachment(index).ok_or_else(|| {
                ProtocolError::InvalidTopology(format!("endpoint {index} has no attachment"))
            })?;
            network.attach(name.clone(), NodeName::switch(switch), port)?;
            roles.push((name, Role::Endpoint { index }));
        }

        match topology {
            Topology::Simple => {}
            Topology::Ring { switches } => {
                for index in 0..switches {
                    let next = NodeName::switch((index + 1) % switches);
                    network.connect(&NodeName::switch(index), LINK_PORT.index(), &next, LINK_PORT.index())?;
                }
            }
            Topology::Tree { branches, .. } => {
                let root = NodeName::switch(branches);
                for index in 0..branches {
                    let branch = NodeName::switch(index);
                    network.connect(&branch, LINK_PORT.index(), &root, index)?;
                    network.connect(&root, index, &branch, LINK_PORT.index())?;
                }
            }
        }

        network.control.register_nodes(roles);
        debug!(
            ?topology,
            switches = network.switches.len(),
            endpoints = network.nodes.len(),
            "network built"
        );
        Ok(network)
    }

    /// Substitui o colaborador quântico
    pub fn with_backend(mut self, backend: impl QuantumBackend + 'static) -> Self {
        self.backend = Box::new(backend);
        self
    }

    fn attach(&mut self, name: NodeName, switch: NodeName, port: usize) -> ProtoResult<()> {
        self.switch_mut(&switch)?.register(name.clone(), port)?;
        self.nodes.insert(name.clone(), QpuNode::new(name.clone()));
        self.attachments.insert(name, (switch, port));
        Ok(())
    }

    /// Liga `qout{out}` de `from` a `qin{input}` de `to`
    fn connect(&mut self, from: &NodeName, out: usize, to: &NodeName, input: usize) -> ProtoResult<()> {
        self.switch_mut(to)?.register(from.clone(), input)?;
        self.switch_mut(from)?.register(to.clone(), out)?;
        self.links.insert((from.clone(), out), (to.clone(), input));
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.config.timing
    }

    pub fn topology(&self) -> Topology {
        self.control.topology()
    }

    pub fn control(&self) -> &ControlNode {
        &self.control
    }

    pub fn stats(&self) -> NetworkStats {
        self.stats
    }

    pub fn switch(&self, name: &NodeName) -> ProtoResult<&FsoSwitch> {
        self.switches
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownNode(name.clone()))
    }

    pub fn switch_mut(&mut self, name: &NodeName) -> ProtoResult<&mut FsoSwitch> {
        self.switches
            .get_mut(name)
            .ok_or_else(|| ProtocolError::UnknownNode(name.clone()))
    }

    pub fn switches(&self) -> impl Iterator<Item = &FsoSwitch> {
        self.switches.values()
    }

    pub fn node(&self, name: &NodeName) -> ProtoResult<&QpuNode> {
        self.nodes
            .get(name)
            .ok_or_else(|| ProtocolError::UnknownNode(name.clone()))
    }

    pub fn node_mut(&mut self, name: &NodeName) -> ProtoResult<&mut QpuNode> {
        self.nodes
            .get_mut(name)
            .ok_or_else(|| ProtocolError::UnknownNode(name.clone()))
    }

    /// Endpoints em ordem de nome
    pub fn endpoints(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.keys()
    }

    /// Switch e porta de acesso de um endpoint
    pub fn attachment(&self, endpoint: &NodeName) -> Option<(&NodeName, usize)> {
        self.attachments.get(endpoint).map(|(switch, port)| (switch, *port))
    }

    /// Destino do link de saída `qout{out}` de um switch
    pub fn link(&self, switch: &NodeName, out: usize) -> Option<(&NodeName, usize)> {
        self.links
            .get(&(switch.clone(), out))
            .map(|(next, input)| (next, *input))
    }

    /// Pede rota ao controle e fixa papéis e id de requisição nos endpoints
    pub fn request_route(&mut self, pair: &EndpointPair, now: SimTime) -> ProtoResult<RequestId> {
        let id = self
            .control
            .request_route(&mut self.switches, &pair.correcting, &pair.passive, now)?;
        for (name, party) in [
            (&pair.correcting, Party::Correcting),
            (&pair.passive, Party::Passive),
        ] {
            let node = self.node_mut(name)?;
            node.set_party(party);
            node.set_request(Some(id));
        }
        Ok(id)
    }

    /// Libera a requisição no controle
    pub fn release_route(&mut self, id: &RequestId) -> bool {
        self.control.release(id).is_some()
    }

    /// Registros de tentativa acumulados desde o último [`Network::take_history`]
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    pub fn take_history(&mut self) -> Vec<AttemptRecord> {
        std::mem::take(&mut self.history)
    }

    pub(crate) fn record_attempt(&mut self, record: AttemptRecord) {
        self.history.push(record);
    }

    /// Inicia programa no processador do endpoint
    ///
    /// `Emit` recebe uma sequência nova, carimbada no fóton emitido.
    pub fn start_program(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        node: &NodeName,
        program: Program,
    ) -> ProtoResult<()> {
        let duration = self.backend.duration(program);
        if self.node(node)?.is_busy() {
            return Err(ProtocolError::ProcessorBusy {
                node: node.clone(),
                program,
            });
        }
        let emission = if program == Program::Emit {
            self.emissions += 1;
            Some(self.emissions)
        } else {
            None
        };
        let qpu = self.node_mut(node)?;
        if let Some(emission) = emission {
            qpu.set_emission(emission);
        }
        qpu.begin(program);
        trace!(%node, %program, %duration, "program started");
        cx.schedule(
            duration,
            NetEvent::ProgramDone {
                node: node.clone(),
                program,
            },
        );
        Ok(())
    }

    fn on_program_done(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        node: NodeName,
        program: Program,
    ) -> ProtoResult<()> {
        let measurement = self.backend.complete(&mut self.rng, &node, program);
        self.node_mut(&node)?.finish(measurement);
        if program == Program::Emit {
            let signal = self.backend.emit(&mut self.rng, &node);
            self.send_photon(cx, &node, signal)?;
        }
        cx.fire(Trigger::Program(node));
        Ok(())
    }

    fn send_photon(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        node: &NodeName,
        signal: Signal,
    ) -> ProtoResult<()> {
        let qpu = self.node(node)?;
        let (request, emission) = (qpu.request(), qpu.emission());
        let (switch, port) = self
            .attachments
            .get(node)
            .cloned()
            .ok_or_else(|| ProtocolError::UnknownNode(node.clone()))?;
        let signal = signal.with_header(Header {
            request,
            origin: Some(node.clone()),
            outport: None,
            emission,
        });
        self.stats.photons_emitted += 1;
        cx.schedule(
            self.config.timing.endpoint_link(),
            NetEvent::Photon {
                switch,
                port,
                signal,
            },
        );
        Ok(())
    }

    fn on_photon(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        switch: NodeName,
        port: usize,
        signal: Signal,
    ) -> ProtoResult<()> {
        let input = InPort::new(port)?;
        let relay = self
            .switches
            .get(&switch)
            .ok_or_else(|| ProtocolError::UnknownNode(switch.clone()))?
            .route(&mut self.rng, input, signal);

        if let Some(side) = relay.output.herald_side() {
            cx.schedule(
                relay.delay,
                NetEvent::Herald {
                    switch,
                    side,
                    signal: relay.signal,
                },
            );
            return Ok(());
        }

        match self.links.get(&(switch.clone(), relay.output.index())) {
            Some((next, input)) => cx.schedule(
                relay.delay + self.config.timing.switch_link(),
                NetEvent::Photon {
                    switch: next.clone(),
                    port: *input,
                    signal: relay.signal,
                },
            ),
            None => {
                self.stats.photons_dropped += 1;
                debug!(%switch, output = %relay.output, "photon left through unwired port");
            }
        }
        Ok(())
    }

    fn on_herald(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        switch: NodeName,
        side: Side,
        signal: Signal,
    ) -> ProtoResult<()> {
        let step = self
            .switches
            .get_mut(&switch)
            .ok_or_else(|| ProtocolError::UnknownNode(switch.clone()))?
            .herald_mut()
            .receive(&mut self.rng, cx.now(), side, signal)?;
        if let Some(arm) = step.armed {
            cx.schedule(
                arm.close_at.since(cx.now()),
                NetEvent::WindowClose {
                    switch,
                    window_id: arm.window_id,
                },
            );
        }
        self.send_to_control(cx, step.messages);
        Ok(())
    }

    fn on_window_close(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        switch: NodeName,
        window_id: u64,
    ) -> ProtoResult<()> {
        let messages = self
            .switches
            .get_mut(&switch)
            .ok_or_else(|| ProtocolError::UnknownNode(switch.clone()))?
            .herald_mut()
            .expire(&mut self.rng, window_id)?;
        self.send_to_control(cx, messages);
        Ok(())
    }

    fn send_to_control(&mut self, cx: &mut WorldContext<'_, NetEvent>, messages: Vec<CorrectionMessage>) {
        for message in messages {
            cx.schedule(self.config.timing.classical(), NetEvent::ControlInbox(message));
        }
    }

    fn on_control(&mut self, cx: &mut WorldContext<'_, NetEvent>, message: CorrectionMessage) {
        match self.control.handle_correction(message) {
            Ok(delivery) => {
                self.stats.corrections_relayed += 1;
                for node in delivery.endpoints {
                    cx.schedule(
                        self.config.timing.classical(),
                        NetEvent::EndpointInbox {
                            node,
                            message: delivery.message,
                        },
                    );
                }
            }
            Err(e) => {
                self.stats.corrections_dropped += 1;
                debug!(error = %e, "correction not relayed");
            }
        }
    }

    fn on_endpoint_inbox(
        &mut self,
        cx: &mut WorldContext<'_, NetEvent>,
        node: NodeName,
        message: CorrectionMessage,
    ) -> ProtoResult<()> {
        self.node_mut(&node)?.deliver(message);
        trace!(%node, ?message, "correction delivered");
        cx.fire(Trigger::Inbox(node));
        Ok(())
    }
}

impl World for Network {
    type Event = NetEvent;
    type Error = ProtocolError;

    fn handle(&mut self, event: NetEvent, cx: &mut WorldContext<'_, NetEvent>) -> ProtoResult<()> {
        match event {
            NetEvent::Photon {
                switch,
                port,
                signal,
            } => self.on_photon(cx, switch, port, signal),
            NetEvent::Herald {
                switch,
                side,
                signal,
            } => self.on_herald(cx, switch, side, signal),
            NetEvent::WindowClose { switch, window_id } => self.on_window_close(cx, switch, window_id),
            NetEvent::ControlInbox(message) => {
                self.on_control(cx, message);
                Ok(())
            }
            NetEvent::EndpointInbox { node, message } => self.on_endpoint_inbox(cx, node, message),
            NetEvent::ProgramDone { node, program } => self.on_program_done(cx, node, program),
        }
    }
}
