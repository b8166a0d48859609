//! End-to-end classification of computed snapshots: window → snapshot →
//! classifier → veto.

use chrono::{Duration, TimeZone, Utc};
use regime_core::classifier::{HysteresisState, RegimeClassifier};
use regime_core::snapshot::keys;
use regime_core::{
    compute_snapshot, Action, GuardianConfig, PricePoint, Regime, VetoEngine, VetoPriority,
};
use std::collections::BTreeSet;

// ── Helpers ──────────────────────────────────────────────────────────

fn point(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> PricePoint {
    PricePoint {
        symbol: "CORE".into(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(i as i64),
        open,
        high,
        low,
        close,
        volume,
    }
}

fn classify(window: &[PricePoint]) -> (Regime, VetoPriority, BTreeSet<Action>, String) {
    let config = GuardianConfig::default();
    let snapshot = compute_snapshot(window, &config.indicators).unwrap();
    let classifier = RegimeClassifier::new(config.classifier.clone());
    let (c, _) = classifier.classify(&snapshot, &HysteresisState::default());
    let d = VetoEngine::new(config.veto).evaluate(&c);
    (c.regime, d.priority, d.allowed, d.reason)
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn flat_zero_volume_tail_is_low_liquidity() {
    let mut window: Vec<_> = (0..22)
        .map(|i| {
            let close: f64 = 100.0 + if i % 2 == 0 { 1.0 } else { -1.0 };
            point(i, 100.0, close.max(100.0) + 0.5, close.min(100.0) - 0.5, close, 1000.0)
        })
        .collect();
    window.extend((22..42).map(|i| point(i, 100.0, 100.0, 100.0, 100.0, 0.0)));

    let (regime, priority, allowed, reason) = classify(&window);
    assert_eq!(regime, Regime::LowLiquidity);
    assert_eq!(priority, VetoPriority::Critical);
    assert!(allowed.is_empty());
    assert!(reason.contains(keys::VOLUME));
}

#[test]
fn tripled_true_range_is_volatility_spike() {
    let window: Vec<_> = (0..42)
        .map(|i| {
            if i >= 39 {
                point(i, 100.0, 101.5, 98.5, 100.0, 1000.0)
            } else {
                point(i, 100.0, 100.5, 99.5, 100.0, 1000.0)
            }
        })
        .collect();

    let (regime, priority, allowed, reason) = classify(&window);
    assert_eq!(regime, Regime::VolatilitySpike);
    assert_eq!(priority, VetoPriority::Critical);
    assert!(allowed.is_empty());
    assert!(reason.contains(keys::TRUE_RANGE_RECENT));
}

#[test]
fn steady_rise_is_bull_trend() {
    let window: Vec<_> = (0..60)
        .map(|i| {
            let close = 100.0 + i as f64;
            point(i, close - 0.5, close + 0.5, close - 0.5, close, 1000.0)
        })
        .collect();

    let (regime, priority, allowed, reason) = classify(&window);
    assert_eq!(regime, Regime::BullTrend);
    assert_eq!(priority, VetoPriority::None);
    assert_eq!(
        allowed,
        BTreeSet::from([Action::Enter, Action::Exit, Action::Reduce])
    );
    assert!(reason.contains(keys::ADX));
}

#[test]
fn steady_fall_is_bear_trend() {
    let window: Vec<_> = (0..60)
        .map(|i| {
            let close = 200.0 - i as f64;
            point(i, close + 0.5, close + 0.5, close - 0.5, close, 1000.0)
        })
        .collect();

    let (regime, priority, allowed, _) = classify(&window);
    assert_eq!(regime, Regime::BearTrend);
    assert_eq!(priority, VetoPriority::High);
    assert_eq!(allowed, BTreeSet::from([Action::Exit]));
}
