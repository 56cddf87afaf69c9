//! Testes unitários do protocolo

use crate::*;
use fso_core::{
    BackendConfig, CorrectionMessage, Encoding, Heralding, Phase, RequestId, SimDuration,
};
use fso_sim::Kernel;
use fso_switch::{InPort, OutPort};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn x() -> NodeName {
    NodeName::from("x")
}

fn y() -> NodeName {
    NodeName::from("y")
}

fn simple(config: SimulationConfig) -> Network {
    Network::simple(config, x(), y()).unwrap()
}

/// Kernel com rota x ↔ y já pedida
fn routed(config: SimulationConfig) -> (Kernel<Network>, RequestId) {
    let mut kernel = Kernel::new(simple(config));
    let pair = EndpointPair::new(x(), y());
    let now = kernel.now();
    let id = kernel.world_mut().request_route(&pair, now).unwrap();
    (kernel, id)
}

fn heralding(request: Option<RequestId>, discriminator: i8) -> NetEvent {
    NetEvent::ControlInbox(CorrectionMessage::new(
        request,
        Heralding {
            discriminator,
            mode: None,
        },
    ))
}

fn run_attempt(kernel: &mut Kernel<Network>, node: NodeName, party: Party) -> AttemptOutcome {
    let timeout = kernel.world().timing().attempt_timeout();
    let id = kernel.spawn(EntanglementAttempt::new(node, party, timeout));
    kernel.run_task(id).unwrap()
}

#[test]
fn test_status_logs() {
    assert_eq!(AttemptStatus::Corrected.log(), "corrected");
    assert_eq!(AttemptStatus::Accepted.log(), "corrected");
    assert_eq!(AttemptStatus::TimedOut.log(), "timeout");
    assert_eq!(AttemptStatus::MalformedMessage.log(), "no_msg");
    assert_eq!(AttemptStatus::NoEntanglement.log(), "no entanglement");
    assert_eq!(AttemptStatus::BadDiscriminator(3).log(), "bad state:3");
    assert!(AttemptStatus::Accepted.is_success());
    assert!(AttemptStatus::TimedOut.is_retryable());
    assert!(!AttemptStatus::BadDiscriminator(0).is_retryable());
    assert!(!AttemptStatus::BadDiscriminator(0).is_success());
}

#[test]
fn test_correcting_party_applies_correction() {
    let (mut kernel, id) = routed(SimulationConfig::default());
    kernel.schedule(SimDuration::from_nanos(2), heralding(Some(id), 1));
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::Corrected);
    assert!(outcome.success());
    assert_eq!(outcome.log(), "corrected");
    assert!(!kernel.world().node(&x()).unwrap().is_busy());
}

#[test]
fn test_passive_party_accepts() {
    let (mut kernel, id) = routed(SimulationConfig::default());
    kernel.schedule(SimDuration::from_nanos(2), heralding(Some(id), 2));
    let outcome = run_attempt(&mut kernel, y(), Party::Passive);
    assert_eq!(outcome.status, AttemptStatus::Accepted);
    assert_eq!(outcome.party, Party::Passive);
}

#[test]
fn test_bad_discriminator_surfaces() {
    for value in [0, 3, 7] {
        let (mut kernel, id) = routed(SimulationConfig::default());
        kernel.schedule(SimDuration::from_nanos(2), heralding(Some(id), value));
        let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
        assert_eq!(outcome.status, AttemptStatus::BadDiscriminator(value));
        assert_eq!(outcome.log(), format!("bad state:{value}"));
    }
}

#[test]
fn test_missing_payload_is_malformed() {
    let (mut kernel, id) = routed(SimulationConfig::default());
    kernel.schedule(
        SimDuration::from_nanos(2),
        NetEvent::ControlInbox(CorrectionMessage::empty(Some(id))),
    );
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::MalformedMessage);
}

#[test]
fn test_lonely_photon_is_no_entanglement() {
    // Só x emite: a janela expira com um lado e vira falha
    let (mut kernel, _) = routed(SimulationConfig::default());
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::NoEntanglement);
    assert_eq!(kernel.world().stats().photons_emitted, 1);
}

#[test]
fn test_timeout() {
    let mut config = SimulationConfig::default();
    config.timing.attempt_timeout_ns = 20;
    let (mut kernel, _) = routed(config);
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::TimedOut);
    assert_eq!(kernel.now().as_nanos(), 20);
}

#[test]
fn test_stale_message_flushed() {
    let mut config = SimulationConfig::default();
    config.timing.attempt_timeout_ns = 20;
    let (mut kernel, id) = routed(config);
    kernel
        .world_mut()
        .node_mut(&x())
        .unwrap()
        .deliver(CorrectionMessage::new(
            Some(id),
            Heralding {
                discriminator: 1,
                mode: None,
            },
        ));
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::TimedOut);
    assert_eq!(kernel.world().node(&x()).unwrap().pending_messages(), 0);
}

fn tagged(id: RequestId, discriminator: i8, emission: u64) -> CorrectionMessage {
    CorrectionMessage::new(
        Some(id),
        Heralding {
            discriminator,
            mode: None,
        },
    )
    .with_emissions([Some(emission), None])
}

#[test]
fn test_correction_for_earlier_emission_discarded() {
    let mut config = SimulationConfig::default();
    config.timing.classical_ns = 5000;
    let (mut kernel, id) = routed(config);
    kernel.schedule(
        SimDuration::from_nanos(2),
        NetEvent::EndpointInbox {
            node: x(),
            message: tagged(id, 1, 999),
        },
    );
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::TimedOut);
    assert_eq!(kernel.now().as_nanos(), 1000);
    assert_eq!(kernel.world().node(&x()).unwrap().pending_messages(), 0);
}

#[test]
fn test_current_emission_accepted_after_stale_one() {
    let mut config = SimulationConfig::default();
    config.timing.classical_ns = 5000;
    let (mut kernel, id) = routed(config);
    // Primeira emissão da rede recebe a sequência 1
    kernel.schedule(
        SimDuration::from_nanos(2),
        NetEvent::EndpointInbox {
            node: x(),
            message: tagged(id, 2, 999),
        },
    );
    kernel.schedule(
        SimDuration::from_nanos(4),
        NetEvent::EndpointInbox {
            node: x(),
            message: tagged(id, 1, 1),
        },
    );
    let outcome = run_attempt(&mut kernel, x(), Party::Correcting);
    assert_eq!(outcome.status, AttemptStatus::Corrected);
    assert_eq!(kernel.world().node(&x()).unwrap().emission(), Some(1));
}

#[test]
fn test_uncorrelated_corrections_dropped() {
    let (mut kernel, _) = routed(SimulationConfig::default());
    kernel.schedule(SimDuration::ZERO, heralding(None, 1));
    kernel.schedule(SimDuration::ZERO, heralding(Some(RequestId::from_u128(5)), 1));
    kernel.run_until_idle().unwrap();
    let stats = kernel.world().stats();
    assert_eq!(stats.corrections_dropped, 2);
    assert_eq!(stats.corrections_relayed, 0);
    assert_eq!(kernel.world().node(&x()).unwrap().pending_messages(), 0);
}

#[test]
fn test_correction_relayed_to_both_endpoints() {
    let (mut kernel, id) = routed(SimulationConfig::default());
    kernel.schedule(SimDuration::ZERO, heralding(Some(id), 2));
    kernel.run_until_idle().unwrap();
    for node in [x(), y()] {
        assert_eq!(kernel.world().node(&node).unwrap().pending_messages(), 1);
    }
    assert_eq!(kernel.world().stats().corrections_relayed, 1);
}

#[test]
fn test_retry_stops_on_bad_discriminator() {
    let (mut kernel, id) = routed(SimulationConfig::default());
    kernel.schedule(SimDuration::from_nanos(2), heralding(Some(id), 3));
    let retry = RetryProtocol::new(
        EndpointPair::new(x(), y()),
        Phase::Initial,
        10,
        SimDuration::from_nanos(1000),
    );
    let outcome = kernel.run(retry).unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(outcome.failure, Some(SessionFailure::BadDiscriminator(3)));
    assert_eq!(outcome.records[0].log_reason, "bad state:3");
}

#[test]
fn test_retry_zero_budget() {
    let (mut kernel, _) = routed(SimulationConfig::default());
    let retry = RetryProtocol::new(
        EndpointPair::new(x(), y()),
        Phase::Initial,
        0,
        SimDuration::from_nanos(1000),
    );
    let outcome = kernel.run(retry).unwrap();
    assert_eq!(outcome.attempts(), 0);
    assert!(matches!(
        outcome.failure,
        Some(SessionFailure::AttemptsExhausted { attempts: 0, .. })
    ));
}

#[test]
fn test_retry_records_continue_session_count() {
    let (mut kernel, _) = routed(SimulationConfig::default());
    let retry = RetryProtocol::new(
        EndpointPair::new(x(), y()),
        Phase::Distillation(2),
        5,
        SimDuration::from_nanos(1000),
    )
    .after(7);
    let outcome = kernel.run(retry).unwrap();
    assert!(outcome.success);
    let record = &outcome.records[0];
    assert_eq!(record.phase, Phase::Distillation(2));
    assert_eq!(record.attempt_number, 1);
    assert_eq!(record.total_attempts, 8);
}

#[test]
fn test_ring_wiring() {
    let network = Network::ring(SimulationConfig::default(), 4).unwrap();
    assert_eq!(network.endpoints().count(), 8);
    assert_eq!(
        network.link(&NodeName::switch(3), 2),
        Some((&NodeName::switch(0), 2))
    );
    assert_eq!(
        network.attachment(&NodeName::endpoint(5)),
        Some((&NodeName::switch(2), 1))
    );
    let sw = network.switch(&NodeName::switch(1)).unwrap();
    assert_eq!(sw.port_of(&NodeName::switch(0)).unwrap(), 2);
    assert_eq!(sw.port_of(&NodeName::switch(2)).unwrap(), 2);
    assert_eq!(network.link(&NodeName::switch(1), 0), None);
}

#[test]
fn test_tree_wiring() {
    let network = Network::tree(SimulationConfig::default(), 3, 2).unwrap();
    let root = NodeName::switch(3);
    assert_eq!(network.link(&NodeName::switch(1), 2), Some((&root, 1)));
    assert_eq!(network.link(&root, 2), Some((&NodeName::switch(2), 2)));
    assert_eq!(network.switches().count(), 4);
}

#[test]
fn test_invalid_networks_rejected() {
    assert!(matches!(
        Network::tree(SimulationConfig::default(), 4, 2),
        Err(ProtocolError::Control(_))
    ));
    assert!(matches!(
        Network::ring(SimulationConfig::default(), 0),
        Err(ProtocolError::Control(_))
    ));
    let mut config = SimulationConfig::default();
    config.detector.det_eff = 2.0;
    assert!(matches!(
        Network::simple(config, x(), y()),
        Err(ProtocolError::Config(_))
    ));
    assert!(matches!(
        Network::build(
            SimulationConfig::default(),
            fso_control::Topology::Simple,
            vec![x()]
        ),
        Err(ProtocolError::InvalidTopology(_))
    ));
}

#[test]
fn test_request_route_sets_parties_and_routing() {
    let (kernel, id) = routed(SimulationConfig::default());
    let network = kernel.world();
    assert_eq!(network.node(&x()).unwrap().party(), Party::Correcting);
    assert_eq!(network.node(&y()).unwrap().party(), Party::Passive);
    assert_eq!(network.node(&y()).unwrap().request(), Some(id));
    let table = network.switch(&NodeName::switch(0)).unwrap().routing();
    assert_eq!(table.output(InPort::new(0).unwrap()), OutPort::new(0).unwrap());
    assert_eq!(table.output(InPort::new(1).unwrap()), OutPort::new(1).unwrap());
}

#[test]
fn test_abstract_backend() {
    let mut rng = StdRng::seed_from_u64(3);
    let node = x();

    let mut backend = AbstractBackend::default();
    assert_eq!(backend.duration(Program::Distill), SimDuration::from_nanos(11));
    assert_eq!(backend.emit(&mut rng, &node).photon_count(), 1);
    assert_eq!(backend.complete(&mut rng, &node, Program::Distill), Some(1));
    assert_eq!(backend.complete(&mut rng, &node, Program::Swap), None);

    let mut dark = AbstractBackend::new(BackendConfig {
        emission_probability: 0.0,
        distillation_success_probability: 0.0,
        ..BackendConfig::default()
    });
    assert_eq!(dark.emit(&mut rng, &node).photon_count(), 0);
    assert_eq!(dark.complete(&mut rng, &node, Program::Distill), Some(0));

    let mut time_bin = AbstractBackend::new(BackendConfig {
        encoding: Encoding::TimeBin,
        ..BackendConfig::default()
    });
    let signal = time_bin.emit(&mut rng, &node);
    assert_eq!(signal.encoding, Encoding::TimeBin);
    assert!(signal.modes[0].and_then(|p| p.bin).is_some());
}

#[test]
fn test_node_inbox() {
    let mut node = QpuNode::new(x());
    assert!(!node.is_busy());
    node.deliver(CorrectionMessage::empty(None));
    node.deliver(CorrectionMessage::empty(None));
    assert_eq!(node.flush_inbox(), 2);
    assert!(node.pop_message().is_none());
    node.begin(Program::Distill);
    assert!(node.is_busy());
    assert_eq!(node.finish(Some(1)), Some(Program::Distill));
    assert_eq!(node.take_measurement(), Some(1));
    assert_eq!(node.take_measurement(), None);
}
