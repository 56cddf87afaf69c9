//! # Detector Benchmarks
//!
//! Measures BSM classification throughput for both encodings and for
//! multi-mode signals.
//!
//! Run: `cargo bench --bench detector_bench`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fso_core::{DetectorConfig, Encoding, Photon, Signal, TimeBin};
use fso_detector::ClickModel;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn noisy() -> ClickModel {
    let config = DetectorConfig {
        p_dark: 0.01,
        det_eff: 0.8,
        visibility: 0.9,
        ..DetectorConfig::default()
    };
    ClickModel::new(&config).unwrap()
}

/// Benchmark single-mode classification
fn bench_single_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector_single_mode");
    let model = noisy();
    let mut rng = StdRng::seed_from_u64(7);

    let left = Signal::single(Encoding::PresenceAbsence, Photon::present());
    let right = Signal::single(Encoding::PresenceAbsence, Photon::present());
    group.bench_function("presence_absence", |b| {
        b.iter(|| black_box(model.measure(&mut rng, &left, &right)))
    });

    let early = Signal::single(Encoding::TimeBin, Photon::in_bin(TimeBin::Early));
    let late = Signal::single(Encoding::TimeBin, Photon::in_bin(TimeBin::Late));
    group.bench_function("time_bin", |b| {
        b.iter(|| black_box(model.measure(&mut rng, &early, &late)))
    });

    group.finish();
}

/// Benchmark multi-mode classification
fn bench_multi_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector_multi_mode");
    let model = noisy();
    let mut rng = StdRng::seed_from_u64(11);

    for modes in [4usize, 32, 256] {
        let signal = Signal {
            encoding: Encoding::PresenceAbsence,
            modes: vec![Some(Photon::present()); modes],
            header: Default::default(),
        };
        group.throughput(Throughput::Elements(modes as u64));
        group.bench_with_input(BenchmarkId::from_parameter(modes), &signal, |b, signal| {
            b.iter(|| black_box(model.measure(&mut rng, signal, signal)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_mode, bench_multi_mode);
criterion_main!(benches);
