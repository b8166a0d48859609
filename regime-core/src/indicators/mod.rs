//! Indicator implementations.
//!
//! Every indicator is a pure function of a price window: points in, a numeric
//! series of the same length out, with `f64::NAN` during warmup. Multi-series
//! indicators (Bollinger, MACD, directional movement) are exposed as separate
//! named instances per output line, keeping the single-series trait unchanged.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use adx::{Adx, DirectionalLine};
pub use atr::{true_range, wilder_smooth, Atr};
pub use bollinger::{Bollinger, BollingerBand};
pub use ema::{ema_of_series, seeded_average};
pub use macd::{Macd, MacdLine};
pub use obv::Obv;
pub use rsi::Rsi;
pub use sma::mean;
pub use volume::percentile;

use crate::domain::PricePoint;

/// Trait for indicators.
///
/// `compute` returns a `Vec<f64>` of the same length as `points`. The first
/// `lookback()` values are `f64::NAN` (warmup); the value at index
/// `lookback()` is the first valid one.
///
/// No value at index t may depend on points after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "rsi_14", "atr_14").
    fn name(&self) -> &str;

    /// Number of warmup points before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the entire window.
    fn compute(&self, points: &[PricePoint]) -> Vec<f64>;
}

/// Create synthetic points from close prices for testing.
///
/// open = prev_close (or close for the first point),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_points(closes: &[f64]) -> Vec<PricePoint> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PricePoint {
                symbol: "TEST".to_string(),
                timestamp: base + Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Create synthetic points from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_points(data: &[(f64, f64, f64, f64)]) -> Vec<PricePoint> {
    use chrono::{Duration, TimeZone, Utc};
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PricePoint {
            symbol: "TEST".to_string(),
            timestamp: base + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
