//! Indicator snapshot computation.
//!
//! The engine computes every configured indicator over the full window and
//! keeps the newest value of each, plus the rolling baselines the classifier
//! compares against. Computation is a pure function of the window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::IndicatorConfig;
use crate::domain::PricePoint;
use crate::error::{GuardianError, Result};
use crate::indicators::{
    mean, percentile, true_range, Adx, Atr, Bollinger, Indicator, Macd, MacdLine, Obv, Rsi,
};

/// Snapshot keys.
pub mod keys {
    pub const CLOSE: &str = "close";
    pub const VOLUME: &str = "volume";
    pub const RSI: &str = "rsi";
    pub const MACD: &str = "macd";
    pub const MACD_SIGNAL: &str = "macd_signal";
    pub const MACD_HISTOGRAM: &str = "macd_histogram";
    pub const BOLLINGER_UPPER: &str = "bollinger_upper";
    pub const BOLLINGER_MID: &str = "bollinger_mid";
    pub const BOLLINGER_LOWER: &str = "bollinger_lower";
    pub const BOLLINGER_WIDTH: &str = "bollinger_width";
    pub const BOLLINGER_WIDTH_BASELINE: &str = "bollinger_width_baseline";
    pub const ADX: &str = "adx";
    pub const PLUS_DI: &str = "plus_di";
    pub const MINUS_DI: &str = "minus_di";
    pub const OBV: &str = "obv";
    pub const ATR: &str = "atr";
    pub const TRUE_RANGE: &str = "true_range";
    pub const TRUE_RANGE_RECENT: &str = "true_range_recent";
    pub const TRUE_RANGE_BASELINE: &str = "true_range_baseline";
    pub const VOLUME_BASELINE: &str = "volume_baseline";
    pub const VOLUME_FLOOR: &str = "volume_floor";
}

/// Newest value of every computed indicator for one symbol.
///
/// Keys are ordered so serialized payloads are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
}

impl IndicatorSnapshot {
    pub fn new(symbol: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert, mostly for synthetic snapshots.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Configured set of indicators, keyed by snapshot name.
pub struct IndicatorEngine {
    config: IndicatorConfig,
    indicators: Vec<(&'static str, Box<dyn Indicator>)>,
}

impl IndicatorEngine {
    /// Engine for an already validated config.
    ///
    /// # Panics
    ///
    /// Panics on a zero period or `macd_slow <= macd_fast`; use
    /// [`try_new`](Self::try_new) for unchecked configs.
    pub fn new(config: &IndicatorConfig) -> Self {
        let c = config;
        let indicators: Vec<(&'static str, Box<dyn Indicator>)> = vec![
            (keys::RSI, Box::new(Rsi::new(c.rsi_period))),
            (
                keys::MACD,
                Box::new(Macd::new(c.macd_fast, c.macd_slow, c.macd_signal, MacdLine::Macd)),
            ),
            (
                keys::MACD_SIGNAL,
                Box::new(Macd::new(c.macd_fast, c.macd_slow, c.macd_signal, MacdLine::Signal)),
            ),
            (
                keys::MACD_HISTOGRAM,
                Box::new(Macd::new(
                    c.macd_fast,
                    c.macd_slow,
                    c.macd_signal,
                    MacdLine::Histogram,
                )),
            ),
            (
                keys::BOLLINGER_UPPER,
                Box::new(Bollinger::upper(c.bollinger_period, c.bollinger_multiplier)),
            ),
            (
                keys::BOLLINGER_MID,
                Box::new(Bollinger::middle(c.bollinger_period, c.bollinger_multiplier)),
            ),
            (
                keys::BOLLINGER_LOWER,
                Box::new(Bollinger::lower(c.bollinger_period, c.bollinger_multiplier)),
            ),
            (keys::ADX, Box::new(Adx::new(c.adx_period))),
            (keys::PLUS_DI, Box::new(Adx::plus_di(c.adx_period))),
            (keys::MINUS_DI, Box::new(Adx::minus_di(c.adx_period))),
            (keys::ATR, Box::new(Atr::new(c.atr_period))),
            (keys::OBV, Box::new(Obv::new())),
        ];
        Self {
            config: config.clone(),
            indicators,
        }
    }

    /// Validate the config, then build the engine.
    pub fn try_new(config: &IndicatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GuardianError::InvalidConfig(e.to_string()))?;
        Ok(Self::new(config))
    }

    /// Minimum window length: the longest indicator warmup, or the span the
    /// volatility and volume baselines need, whichever is larger.
    pub fn required_points(&self) -> usize {
        let c = &self.config;
        let warmup = self
            .indicators
            .iter()
            .map(|(_, ind)| ind.lookback() + 1)
            .max()
            .unwrap_or(1);
        // TR[0] has no previous close, so true-range baselines start at index 1.
        let true_range_span = c.spike_window + c.baseline_period + 1;
        let width_span = c.spike_window + c.baseline_period + c.bollinger_period - 1;
        let volume_span = c.baseline_period + 1;
        warmup.max(true_range_span).max(width_span).max(volume_span)
    }

    /// Compute a snapshot for one symbol's window (oldest first).
    pub fn compute(&self, window: &[PricePoint]) -> Result<IndicatorSnapshot> {
        let required = self.required_points();
        if window.len() < required {
            return Err(GuardianError::InsufficientData {
                required,
                available: window.len(),
            });
        }
        validate_window(window)?;

        let last = window.len() - 1;
        let newest = &window[last];
        let mut snapshot = IndicatorSnapshot::new(newest.symbol.clone(), newest.timestamp);

        for (key, indicator) in &self.indicators {
            let series = indicator.compute(window);
            debug_assert_eq!(series.len(), window.len(), "indicator '{}'", indicator.name());
            snapshot.insert(key, series[last]);
        }

        snapshot.insert(keys::CLOSE, newest.close);
        snapshot.insert(keys::VOLUME, newest.volume);

        let c = &self.config;
        let w = c.spike_window;
        let b = c.baseline_period;
        let n = window.len();

        let tr = true_range(window);
        snapshot.insert(keys::TRUE_RANGE, tr[last]);
        snapshot.insert(keys::TRUE_RANGE_RECENT, mean_or_nan(&tr[n - w..]));
        snapshot.insert(keys::TRUE_RANGE_BASELINE, mean_or_nan(&tr[n - w - b..n - w]));

        let width = Bollinger::width(c.bollinger_period, c.bollinger_multiplier).compute(window);
        snapshot.insert(keys::BOLLINGER_WIDTH, width[last]);
        snapshot.insert(keys::BOLLINGER_WIDTH_BASELINE, mean_or_nan(&width[n - w - b..n - w]));

        let prior_volumes: Vec<f64> = window[n - 1 - b..n - 1].iter().map(|p| p.volume).collect();
        snapshot.insert(keys::VOLUME_BASELINE, mean_or_nan(&prior_volumes));
        snapshot.insert(
            keys::VOLUME_FLOOR,
            percentile(&prior_volumes, c.volume_floor_percentile).unwrap_or(f64::NAN),
        );

        if let Some((name, _)) = snapshot.values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(GuardianError::InvalidIndicatorValue {
                name: name.clone(),
                context: format!("computed over {n} points ending {}", newest.timestamp),
            });
        }

        Ok(snapshot)
    }
}

/// Compute an indicator snapshot for a window with the given lookbacks.
///
/// Fails with `InvalidConfig` for an unusable config and with
/// `InsufficientData` if the window is shorter than
/// `config.required_points()`; no partial snapshot is produced.
pub fn compute_snapshot(window: &[PricePoint], config: &IndicatorConfig) -> Result<IndicatorSnapshot> {
    IndicatorEngine::try_new(config)?.compute(window)
}

/// Structural checks: single symbol, strictly increasing timestamps, finite data.
pub fn validate_window(window: &[PricePoint]) -> Result<()> {
    let Some(first) = window.first() else {
        return Err(GuardianError::InvalidWindow("window is empty".into()));
    };

    for (i, point) in window.iter().enumerate() {
        if point.symbol != first.symbol {
            return Err(GuardianError::InvalidWindow(format!(
                "point {i} belongs to {} but window is for {}",
                point.symbol, first.symbol
            )));
        }
        if let Some(field) = point.invalid_field() {
            return Err(GuardianError::InvalidIndicatorValue {
                name: field.to_string(),
                context: format!("{} point {i} at {}", point.symbol, point.timestamp),
            });
        }
        if i > 0 && point.timestamp <= window[i - 1].timestamp {
            return Err(GuardianError::InvalidWindow(format!(
                "timestamps must be strictly increasing (point {i} at {})",
                point.timestamp
            )));
        }
    }
    Ok(())
}

fn mean_or_nan(values: &[f64]) -> f64 {
    mean(values).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rising_window(n: usize) -> Vec<PricePoint> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                PricePoint {
                    symbol: "ETH".into(),
                    timestamp: base + Duration::hours(i as i64),
                    open: close - 0.5,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn snapshot_contains_every_key() {
        let config = IndicatorConfig::default();
        let window = rising_window(config.required_points());
        let snapshot = compute_snapshot(&window, &config).unwrap();
        for key in [
            keys::CLOSE,
            keys::VOLUME,
            keys::RSI,
            keys::MACD,
            keys::MACD_SIGNAL,
            keys::MACD_HISTOGRAM,
            keys::BOLLINGER_UPPER,
            keys::BOLLINGER_MID,
            keys::BOLLINGER_LOWER,
            keys::BOLLINGER_WIDTH,
            keys::BOLLINGER_WIDTH_BASELINE,
            keys::ADX,
            keys::PLUS_DI,
            keys::MINUS_DI,
            keys::OBV,
            keys::ATR,
            keys::TRUE_RANGE,
            keys::TRUE_RANGE_RECENT,
            keys::TRUE_RANGE_BASELINE,
            keys::VOLUME_BASELINE,
            keys::VOLUME_FLOOR,
        ] {
            assert!(snapshot.get(key).is_some(), "missing {key}");
        }
        assert_eq!(snapshot.len(), 21);
        assert_eq!(snapshot.symbol, "ETH");
        assert_eq!(snapshot.timestamp, window.last().unwrap().timestamp);
    }

    #[test]
    fn one_point_short_is_insufficient() {
        let config = IndicatorConfig::default();
        let required = config.required_points();
        let window = rising_window(required - 1);
        assert_eq!(
            compute_snapshot(&window, &config),
            Err(GuardianError::InsufficientData {
                required,
                available: required - 1
            })
        );
    }

    #[test]
    fn exact_required_length_is_complete_for_small_lookbacks() {
        let config = IndicatorConfig {
            rsi_period: 3,
            macd_fast: 2,
            macd_slow: 4,
            macd_signal: 2,
            bollinger_period: 3,
            bollinger_multiplier: 2.0,
            adx_period: 3,
            atr_period: 3,
            spike_window: 2,
            baseline_period: 3,
            volume_floor_percentile: 5.0,
        };
        let window = rising_window(config.required_points());
        assert!(compute_snapshot(&window, &config).is_ok());
    }

    #[test]
    fn rising_window_values() {
        let config = IndicatorConfig::default();
        let window = rising_window(60);
        let s = compute_snapshot(&window, &config).unwrap();
        assert_eq!(s.get(keys::RSI), Some(100.0));
        assert!(s.get(keys::PLUS_DI).unwrap() > s.get(keys::MINUS_DI).unwrap());
        assert!(s.get(keys::MACD).unwrap() > 0.0);
        // TR = |high - prev_close| = 1.5 on every point after the first
        assert!((s.get(keys::TRUE_RANGE_RECENT).unwrap() - 1.5).abs() < 1e-12);
        assert!((s.get(keys::TRUE_RANGE_BASELINE).unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(s.get(keys::OBV), Some(59_000.0));
        assert_eq!(s.get(keys::VOLUME_BASELINE), Some(1000.0));
    }

    #[test]
    fn rejects_non_finite_input() {
        let config = IndicatorConfig::default();
        let mut window = rising_window(50);
        window[10].high = f64::NAN;
        let err = compute_snapshot(&window, &config).unwrap_err();
        assert!(err.is_unclassifiable());
    }

    #[test]
    fn rejects_unordered_timestamps() {
        let config = IndicatorConfig::default();
        let mut window = rising_window(50);
        window.swap(20, 21);
        assert!(matches!(
            compute_snapshot(&window, &config),
            Err(GuardianError::InvalidWindow(_))
        ));
    }

    #[test]
    fn rejects_mixed_symbols() {
        let config = IndicatorConfig::default();
        let mut window = rising_window(50);
        window[5].symbol = "BTC".into();
        assert!(matches!(
            compute_snapshot(&window, &config),
            Err(GuardianError::InvalidWindow(_))
        ));
    }

    #[test]
    fn unusable_config_is_an_error_not_a_panic() {
        let window = rising_window(60);
        for config in [
            IndicatorConfig {
                rsi_period: 0,
                ..IndicatorConfig::default()
            },
            IndicatorConfig {
                macd_fast: 26,
                macd_slow: 12,
                ..IndicatorConfig::default()
            },
            IndicatorConfig {
                spike_window: 0,
                ..IndicatorConfig::default()
            },
        ] {
            assert!(matches!(
                compute_snapshot(&window, &config),
                Err(GuardianError::InvalidConfig(_))
            ));
        }
    }
}
