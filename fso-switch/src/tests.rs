//! Testes do switch FSO

use crate::*;
use fso_core::{
    ChannelConfig, DetectorConfig, Encoding, Header, NodeName, Photon, RequestId, Side, Signal,
    SimTime, SwitchConfig,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn switch() -> FsoSwitch {
    let mut sw = FsoSwitch::new(
        NodeName::switch(0),
        &SwitchConfig::default(),
        &DetectorConfig::default(),
    )
    .unwrap();
    sw.register(NodeName::endpoint(0), 0).unwrap();
    sw.register(NodeName::endpoint(1), 1).unwrap();
    sw.register(NodeName::switch(1), 2).unwrap();
    sw
}

fn photon(request: u128) -> Signal {
    Signal::single(Encoding::PresenceAbsence, Photon::present()).with_header(Header {
        request: Some(RequestId::from_u128(request)),
        ..Header::default()
    })
}

fn names(outputs: [usize; 3]) -> Vec<(String, String)> {
    outputs
        .iter()
        .enumerate()
        .map(|(i, o)| (format!("qin{i}"), format!("qout{o}")))
        .collect()
}

#[test]
fn test_identity_by_default() {
    let sw = switch();
    assert_eq!(sw.routing(), &RoutingTable::identity());
    assert_eq!(sw.routing().to_string(), "{qin0->qout0, qin1->qout1, qin2->qout2}");
}

#[test]
fn test_every_mapping_accepted_iff_bijection() {
    for a in 0..3 {
        for b in 0..3 {
            for c in 0..3 {
                let mut sw = switch();
                sw.set_routing(names([2, 0, 1])).unwrap();
                let before = sw.routing().clone();

                let bijective = a != b && b != c && a != c;
                let result = sw.set_routing(names([a, b, c]));
                assert_eq!(result.is_ok(), bijective, "mapping {a}{b}{c}");
                assert!(sw.routing().is_bijection());
                if bijective {
                    assert_eq!(sw.routing().output(InPort::new(0).unwrap()).index(), a);
                } else {
                    assert!(matches!(result, Err(SwitchError::InvalidRoutingTable(_))));
                    assert_eq!(sw.routing(), &before);
                }
            }
        }
    }
}

#[test]
fn test_partial_and_unknown_tables_rejected() {
    let mut sw = switch();
    assert!(sw.set_routing([("qin0", "qout1"), ("qin1", "qout0")]).is_err());
    assert!(sw.set_routing([("qin0", "qout0"), ("qin1", "qout1"), ("qin3", "qout2")]).is_err());
    assert!(sw.set_routing([("qin0", "qout0"), ("qin0", "qout1"), ("qin2", "qout2")]).is_err());
    assert_eq!(sw.routing(), &RoutingTable::identity());
}

#[test]
fn test_herald_switch() {
    let mut sw = switch();
    sw.herald_switch(&NodeName::endpoint(1), &NodeName::switch(1)).unwrap();
    let table = sw.routing();
    assert_eq!(table.output(InPort::new(1).unwrap()), OutPort::new(0).unwrap());
    assert_eq!(table.output(InPort::new(2).unwrap()), OutPort::new(1).unwrap());
    assert_eq!(table.output(InPort::new(0).unwrap()), LINK_PORT);
}

#[test]
fn test_herald_switch_same_port_rejected() {
    let mut sw = switch();
    sw.register(NodeName::from("alias"), 0).unwrap();
    let err = sw
        .herald_switch(&NodeName::endpoint(0), &NodeName::from("alias"))
        .unwrap_err();
    assert!(matches!(err, SwitchError::InvalidRoutingTable(_)));
    assert_eq!(sw.routing(), &RoutingTable::identity());
}

#[test]
fn test_unknown_neighbor() {
    let mut sw = switch();
    let err = sw
        .herald_switch(&NodeName::endpoint(0), &NodeName::endpoint(9))
        .unwrap_err();
    assert_eq!(
        err,
        SwitchError::UnknownNeighbor {
            switch: NodeName::switch(0),
            neighbor: NodeName::endpoint(9),
        }
    );
}

#[test]
fn test_relay_switch_connects_through() {
    let mut sw = switch();
    sw.relay_switch(&NodeName::endpoint(0), &NodeName::switch(1)).unwrap();
    assert_eq!(sw.routing().output(InPort::new(0).unwrap()), LINK_PORT);
    assert!(sw.routing().is_bijection());
    assert_eq!(sw.routing().input_for(LINK_PORT), InPort::new(0).unwrap());
}

#[test]
fn test_default_routing_idempotent() {
    let mut sw = switch();
    sw.relay_switch(&NodeName::endpoint(1), &NodeName::switch(1)).unwrap();
    sw.default_routing();
    let once = sw.routing().clone();
    sw.default_routing();
    assert_eq!(sw.routing(), &once);
    assert_eq!(once, RoutingTable::identity());
}

#[test]
fn test_register_rejects_out_of_range_port() {
    let mut sw = switch();
    assert!(sw.register(NodeName::from("x"), 3).is_err());
}

#[test]
fn test_tier_by_port_distance() {
    let p = |i| InPort::new(i).unwrap();
    let q = |o| OutPort::new(o).unwrap();
    assert_eq!(Tier::between(p(1), q(1)), Tier::Short);
    assert_eq!(Tier::between(p(2), q(1)), Tier::Mid);
    assert_eq!(Tier::between(p(0), q(2)), Tier::Long);
}

#[test]
fn test_route_marks_outport_and_delay() {
    let mut sw = switch();
    sw.herald_switch(&NodeName::endpoint(0), &NodeName::endpoint(1)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let relay = sw.route(&mut rng, InPort::new(0).unwrap(), photon(1));
    assert_eq!(relay.output.index(), 0);
    assert_eq!(relay.signal.header.outport, Some(0));
    assert_eq!(relay.delay.as_nanos(), 25);
    assert_eq!(relay.lost, 0);
}

#[test]
fn test_lossy_channel_yields_vacuum() {
    let config = SwitchConfig {
        short: ChannelConfig {
            p_loss_init: 1.0,
            ..ChannelConfig::default()
        },
        ..SwitchConfig::default()
    };
    let sw = FsoSwitch::new(NodeName::switch(0), &config, &DetectorConfig::default()).unwrap();
    let relay = sw.route(&mut StdRng::seed_from_u64(3), InPort::new(2).unwrap(), photon(1));
    assert_eq!(relay.lost, 1);
    assert_eq!(relay.signal.photon_count(), 0);
    assert_eq!(relay.signal.modes.len(), 1);
}

#[test]
fn test_dampening_damps_photon() {
    let config = SwitchConfig {
        dampening: 1.0,
        ..SwitchConfig::default()
    };
    let sw = FsoSwitch::new(NodeName::switch(0), &config, &DetectorConfig::default()).unwrap();
    let relay = sw.route(&mut StdRng::seed_from_u64(3), InPort::new(1).unwrap(), photon(1));
    assert_eq!(relay.signal.photon_count(), 0);
}

#[test]
fn test_herald_unit_stamps_latest_request() {
    let mut herald = HeraldUnit::new(&DetectorConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let first = herald
        .receive(&mut rng, SimTime::ZERO, Side::Left, photon(10))
        .unwrap();
    assert!(first.messages.is_empty());
    assert!(first.armed.is_some());

    let mut vacuum = photon(11);
    vacuum.modes[0] = Some(Photon::vacuum());
    let second = herald
        .receive(&mut rng, SimTime::from_nanos(5), Side::Right, vacuum)
        .unwrap();
    assert_eq!(second.messages.len(), 1);
    let message = second.messages[0];
    assert_eq!(message.request, Some(RequestId::from_u128(11)));
    let payload = message.payload.unwrap();
    assert!(payload.discriminator == 1 || payload.discriminator == 2);
    assert_eq!(herald.latest_request(), Some(RequestId::from_u128(11)));
}

#[test]
fn test_herald_unit_stamps_window_emissions() {
    let mut herald = HeraldUnit::new(&DetectorConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let tagged = |request, emission| {
        let mut signal = photon(request);
        signal.header.emission = Some(emission);
        signal
    };

    let first = herald
        .receive(&mut rng, SimTime::ZERO, Side::Left, tagged(1, 41))
        .unwrap();
    assert!(first.messages.is_empty());
    let second = herald
        .receive(&mut rng, SimTime::from_nanos(3), Side::Right, tagged(1, 42))
        .unwrap();
    assert_eq!(second.messages.len(), 1);
    assert_eq!(second.messages[0].emissions, [Some(41), Some(42)]);

    // Janela unilateral: só a emissão que chegou
    let lonely = herald
        .receive(&mut rng, SimTime::from_nanos(10), Side::Left, tagged(1, 43))
        .unwrap();
    let messages = herald.expire(&mut rng, lonely.armed.unwrap().window_id).unwrap();
    assert_eq!(messages[0].emissions, [Some(43), None]);
}

#[test]
fn test_herald_unit_one_sided_failure() {
    let mut herald = HeraldUnit::new(&DetectorConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let step = herald
        .receive(&mut rng, SimTime::ZERO, Side::Left, photon(4))
        .unwrap();
    let messages = herald.expire(&mut rng, step.armed.unwrap().window_id).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].payload.unwrap().discriminator, -1);
    assert_eq!(herald.stats().one_sided, 1);
}

#[test]
fn test_fabric_lookup() {
    let mut fabric = std::collections::BTreeMap::new();
    fabric.insert(NodeName::switch(0), switch());
    assert!(fabric.require_switch(&NodeName::switch(0)).is_ok());
    assert_eq!(
        fabric.require_switch(&NodeName::switch(5)).unwrap_err(),
        SwitchError::UnknownSwitch(NodeName::switch(5))
    );
}
