//! Testes do detector BSM

use crate::*;
use fso_core::{
    BellIndex, DetectionOutcome, DetectorConfig, Encoding, Photon, Side, Signal, SimTime, TimeBin,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn present() -> Signal {
    Signal::single(Encoding::PresenceAbsence, Photon::present())
}

fn vacuum() -> Signal {
    Signal::single(Encoding::PresenceAbsence, Photon::vacuum())
}

fn bin(b: TimeBin) -> Signal {
    Signal::single(Encoding::TimeBin, Photon::in_bin(b))
}

fn model(config: DetectorConfig) -> ClickModel {
    ClickModel::new(&config).unwrap()
}

#[test]
fn test_invalid_parameter_rejected() {
    let config = DetectorConfig {
        det_eff: 1.2,
        ..DetectorConfig::default()
    };
    assert_eq!(
        ClickModel::new(&config).unwrap_err(),
        DetectorError::InvalidParameter {
            name: "det_eff",
            value: 1.2
        }
    );
}

#[test]
fn test_single_photon_heralds() {
    let m = ClickModel::ideal();
    let mut rng = rng();
    for _ in 0..50 {
        let outcomes = m.measure(&mut rng, &present(), &vacuum()).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
        assert!(matches!(
            outcomes[0].bell(),
            Some(BellIndex::PsiPlus | BellIndex::PsiMinus)
        ));
    }
}

#[test]
fn test_both_vacuum_fails() {
    let m = ClickModel::ideal();
    let outcomes = m.measure(&mut rng(), &vacuum(), &vacuum()).unwrap();
    assert_eq!(outcomes, vec![DetectionOutcome::failure()]);
}

#[test]
fn test_zero_efficiency_never_heralds() {
    let m = model(DetectorConfig {
        det_eff: 0.0,
        ..DetectorConfig::default()
    });
    let mut rng = rng();
    for _ in 0..50 {
        assert!(!m.measure(&mut rng, &present(), &present()).unwrap()[0].is_success());
    }
}

#[test]
fn test_dark_counts_on_both_detectors_fail() {
    let m = model(DetectorConfig {
        det_eff: 0.0,
        p_dark: 1.0,
        ..DetectorConfig::default()
    });
    assert!(!m.measure(&mut rng(), &vacuum(), &vacuum()).unwrap()[0].is_success());
}

#[test]
fn test_bunched_pair_resolving_vs_not() {
    // Visibilidade 1: os dois fótons sempre saem no mesmo detector
    let plain = ClickModel::ideal();
    let resolving = model(DetectorConfig {
        num_resolving: true,
        ..DetectorConfig::default()
    });
    let mut rng = rng();
    for _ in 0..50 {
        assert!(plain.measure(&mut rng, &present(), &present()).unwrap()[0].is_success());
        assert!(!resolving.measure(&mut rng, &present(), &present()).unwrap()[0].is_success());
    }
}

#[test]
fn test_time_bin_distinct_bins_succeed() {
    let m = ClickModel::ideal();
    let mut rng = rng();
    let mut seen = [false; 2];
    for _ in 0..100 {
        let outcome = m.measure(&mut rng, &bin(TimeBin::Early), &bin(TimeBin::Late)).unwrap()[0];
        match outcome.bell() {
            Some(BellIndex::PsiPlus) => seen[0] = true,
            Some(BellIndex::PsiMinus) => seen[1] = true,
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(seen, [true, true]);
}

#[test]
fn test_time_bin_same_bin_fails() {
    let m = ClickModel::ideal();
    let mut rng = rng();
    for _ in 0..50 {
        assert!(!m.measure(&mut rng, &bin(TimeBin::Early), &bin(TimeBin::Early)).unwrap()[0].is_success());
    }
}

#[test]
fn test_time_bin_without_bin_is_error() {
    let m = ClickModel::ideal();
    let bare = Signal::single(Encoding::TimeBin, Photon::present());
    assert_eq!(
        m.measure(&mut rng(), &bare, &bin(TimeBin::Late)).unwrap_err(),
        DetectorError::MissingTimeBin(0)
    );
}

#[test]
fn test_mixed_encoding_is_fatal() {
    let m = ClickModel::ideal();
    assert!(matches!(
        m.measure(&mut rng(), &present(), &bin(TimeBin::Early)),
        Err(DetectorError::MixedEncoding { .. })
    ));
}

#[test]
fn test_mode_count_mismatch_is_fatal() {
    let m = ClickModel::ideal();
    let mut wide = present();
    wide.modes.push(Some(Photon::present()));
    assert_eq!(
        m.measure(&mut rng(), &wide, &present()).unwrap_err(),
        DetectorError::ModeCountMismatch { left: 2, right: 1 }
    );
}

#[test]
fn test_multi_mode_first_success() {
    let m = ClickModel::ideal();
    let left = Signal {
        encoding: Encoding::PresenceAbsence,
        modes: vec![Some(Photon::vacuum()), Some(Photon::present()), Some(Photon::present())],
        header: Default::default(),
    };
    let right = Signal {
        modes: vec![None, Some(Photon::vacuum()), Some(Photon::vacuum())],
        ..left.clone()
    };
    let outcomes = m.measure(&mut rng(), &left, &right).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].mode(), Some(1));
}

#[test]
fn test_multi_mode_all_successes() {
    let m = model(DetectorConfig {
        allow_multiple_successful_modes: true,
        ..DetectorConfig::default()
    });
    let left = Signal {
        encoding: Encoding::PresenceAbsence,
        modes: vec![Some(Photon::present()), Some(Photon::vacuum()), Some(Photon::present())],
        header: Default::default(),
    };
    let right = Signal {
        modes: vec![Some(Photon::vacuum()); 3],
        ..left.clone()
    };
    let modes: Vec<_> = m
        .measure(&mut rng(), &left, &right)
        .unwrap()
        .iter()
        .map(DetectionOutcome::mode)
        .collect();
    assert_eq!(modes, vec![Some(0), Some(2)]);
}

#[test]
fn test_window_pairs_both_sides() {
    let mut bsm = BsmDetector::new(&DetectorConfig::default()).unwrap();
    let mut rng = rng();

    let first = bsm.receive(&mut rng, SimTime::from_nanos(0), Side::Left, present()).unwrap();
    let arm = first.armed.unwrap();
    assert_eq!(arm.close_at, SimTime::from_nanos(300));
    assert!(first.reports.is_empty());

    let second = bsm.receive(&mut rng, SimTime::from_nanos(100), Side::Right, vacuum()).unwrap();
    assert!(second.armed.is_none());
    assert_eq!(second.reports.len(), 2);
    assert_eq!(second.reports[0].outcomes, second.reports[1].outcomes);
    assert!(second.reports[0].primary().is_success());

    // Expiração posterior da mesma janela não produz nada
    assert!(bsm.expire(&mut rng, arm.window_id).unwrap().is_empty());
    assert_eq!(bsm.stats().coincidences, 1);
}

#[test]
fn test_window_expiry_reports_only_sender() {
    let mut bsm = BsmDetector::new(&DetectorConfig::default()).unwrap();
    let mut rng = rng();
    let step = bsm.receive(&mut rng, SimTime::ZERO, Side::Right, present()).unwrap();
    let reports = bsm.expire(&mut rng, step.armed.unwrap().window_id).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].side, Side::Right);
    assert!(!reports[0].primary().is_success());
    assert_eq!(bsm.stats().one_sided, 1);
}

#[test]
fn test_duplicate_side_flushes_window() {
    let mut bsm = BsmDetector::new(&DetectorConfig::default()).unwrap();
    let mut rng = rng();
    let first = bsm.receive(&mut rng, SimTime::ZERO, Side::Left, present()).unwrap();
    let second = bsm.receive(&mut rng, SimTime::from_nanos(10), Side::Left, present()).unwrap();

    assert_eq!(second.reports.len(), 1);
    assert_eq!(second.reports[0].window_id, first.armed.unwrap().window_id);
    assert_eq!(second.reports[0].side, Side::Left);
    assert!(second.armed.is_some());
}

#[test]
fn test_arrival_after_window_opens_new_one() {
    let mut window = CoincidenceWindow::new(fso_core::SimDuration::from_nanos(300));
    window.offer(SimTime::ZERO, Side::Left, present());
    let offer = window.offer(SimTime::from_nanos(301), Side::Right, present());
    assert_eq!(offer.closed.len(), 1);
    assert_eq!(offer.closed[0].senders(), vec![Side::Left]);
    assert_eq!(offer.armed.map(|a| a.window_id), Some(1));
}
