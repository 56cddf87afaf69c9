//! # Session Benchmarks
//!
//! Measures complete simulated sessions: retry on a simple network and
//! continuous distillation on ring and tree networks.
//!
//! Run: `cargo bench --bench session_bench`

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fso_core::{NodeName, SimulationConfig};
use fso_protocol::{Network, Session};

fn lossy() -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.detector.det_eff = 0.7;
    // Oito saltos no anel ultrapassam a janela padrão
    config.detector.coincidence_window_ns = 2_000;
    config.timing.attempt_timeout_ns = 5_000;
    config
}

/// Benchmark simple-topology sessions
fn bench_simple(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_simple");
    let (a, b) = (NodeName::from("alice"), NodeName::from("bob"));

    group.bench_function("distillation_3_rounds", |bench| {
        bench.iter(|| {
            let network = Network::simple(lossy(), a.clone(), b.clone()).unwrap();
            let mut session = Session::new(network);
            session.request_route(&a, &b).unwrap();
            black_box(session.run_distillation(10, 3))
        })
    });

    group.finish();
}

/// Benchmark multi-hop sessions
fn bench_multi_hop(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_multi_hop");

    group.bench_function("ring_8_far_pair", |bench| {
        bench.iter(|| {
            let mut session = Session::new(Network::ring(lossy(), 8).unwrap());
            session
                .request_route(&NodeName::endpoint(0), &NodeName::endpoint(15))
                .unwrap();
            black_box(session.run_distillation(10, 2))
        })
    });

    group.bench_function("tree_3x2_cross_branch", |bench| {
        bench.iter(|| {
            let mut session = Session::new(Network::tree(lossy(), 3, 2).unwrap());
            session
                .request_route(&NodeName::endpoint(1), &NodeName::endpoint(4))
                .unwrap();
            black_box(session.run_distillation(10, 2))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_simple, bench_multi_hop);
criterion_main!(benches);
