//! # Routing Benchmarks
//!
//! Measures switch command computation for every endpoint pair of ring and
//! tree topologies.
//!
//! Run: `cargo bench --bench routing_bench`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fso_control::{EndpointRef, Topology};
use fso_core::NodeName;

fn endpoints(topology: Topology) -> Vec<EndpointRef> {
    (0..topology.endpoint_count())
        .map(|index| EndpointRef {
            name: NodeName::endpoint(index),
            index,
        })
        .collect()
}

fn all_pairs(topology: Topology, endpoints: &[EndpointRef]) -> usize {
    let mut commands = 0;
    for a in endpoints {
        for b in endpoints {
            if a.index != b.index {
                if let Ok(plan) = topology.commands(a, b) {
                    commands += plan.len();
                }
            }
        }
    }
    commands
}

/// Benchmark ring routing as the ring grows
fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_routing");

    for switches in [4usize, 16, 64] {
        let topology = Topology::Ring { switches };
        let endpoints = endpoints(topology);
        group.bench_with_input(BenchmarkId::new("all_pairs", switches), &endpoints, |b, endpoints| {
            b.iter(|| black_box(all_pairs(topology, endpoints)))
        });
    }

    group.finish();
}

/// Benchmark tree routing
fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_routing");

    let topology = Topology::Tree {
        branches: 3,
        branch_size: 2,
    };
    let endpoints = endpoints(topology);
    group.bench_function("all_pairs", |b| {
        b.iter(|| black_box(all_pairs(topology, &endpoints)))
    });

    group.finish();
}

criterion_group!(benches, bench_ring, bench_tree);
criterion_main!(benches);
