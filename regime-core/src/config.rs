//! Guardian configuration: lookbacks, classification thresholds, veto policy.
//!
//! Every threshold is configuration rather than an embedded constant.
//! Configs load from TOML with per-field defaults, so a file only needs the
//! values it overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::snapshot::IndicatorEngine;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Lookback lengths for the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_multiplier: f64,
    pub adx_period: usize,
    pub atr_period: usize,
    /// Number of most recent points whose mean true range is compared to the baseline.
    pub spike_window: usize,
    /// Number of points forming the rolling volatility and volume baselines.
    pub baseline_period: usize,
    /// Percentile of baseline volumes used as the liquidity floor.
    pub volume_floor_percentile: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_multiplier: 2.0,
            adx_period: 14,
            atr_period: 14,
            spike_window: 3,
            baseline_period: 20,
            volume_floor_percentile: 5.0,
        }
    }
}

impl IndicatorConfig {
    /// Minimum window length that produces a complete snapshot.
    ///
    /// Expects a validated config.
    pub fn required_points(&self) -> usize {
        IndicatorEngine::new(self).required_points()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("indicators.rsi_period", self.rsi_period),
            ("indicators.macd_fast", self.macd_fast),
            ("indicators.macd_signal", self.macd_signal),
            ("indicators.bollinger_period", self.bollinger_period),
            ("indicators.adx_period", self.adx_period),
            ("indicators.atr_period", self.atr_period),
            ("indicators.spike_window", self.spike_window),
            ("indicators.baseline_period", self.baseline_period),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be >= 1"));
            }
        }
        if self.macd_slow <= self.macd_fast {
            return Err(invalid("indicators.macd_slow", "must exceed macd_fast"));
        }
        if !(self.bollinger_multiplier.is_finite() && self.bollinger_multiplier > 0.0) {
            return Err(invalid("indicators.bollinger_multiplier", "must be positive"));
        }
        if !(0.0..=100.0).contains(&self.volume_floor_percentile) {
            return Err(invalid("indicators.volume_floor_percentile", "must be within [0, 100]"));
        }
        Ok(())
    }
}

/// Thresholds for the regime rule table and hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Recent true range or band width above baseline * multiplier is a spike.
    pub volatility_multiplier: f64,
    /// Absolute volume at or below which liquidity is considered gone.
    pub min_volume: f64,
    pub adx_threshold: f64,
    /// Required gap between +DI and -DI for a directional call.
    pub di_margin: f64,
    /// Volume below baseline * ratio counts toward stagnation.
    pub stagnation_volume_ratio: f64,
    pub stagnation_adx_ceiling: f64,
    /// Consecutive top matches required before a new regime is emitted.
    pub hysteresis_periods: u32,
    /// Let CRITICAL candidates bypass hysteresis.
    pub escalate_immediately: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            volatility_multiplier: 2.0,
            min_volume: 0.0,
            adx_threshold: 25.0,
            di_margin: 0.0,
            stagnation_volume_ratio: 0.5,
            stagnation_adx_ceiling: 20.0,
            hysteresis_periods: 3,
            escalate_immediately: false,
        }
    }
}

/// Veto policy knobs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VetoPolicy {
    /// When true, CRITICAL regimes still allow EXIT; otherwise they block everything.
    pub critical_allows_exit: bool,
}

/// Classification history retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Records kept per symbol by in-memory history stores.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}

/// Complete guardian configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardianConfig {
    pub indicators: IndicatorConfig,
    pub classifier: ClassifierConfig,
    pub veto: VetoPolicy,
    pub history: HistoryConfig,
}

/// Deterministic hash of a configuration, stored with every record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigFingerprint(pub String);

impl fmt::Display for ConfigFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl GuardianConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// BLAKE3 hash of the canonical JSON encoding.
    pub fn fingerprint(&self) -> Result<ConfigFingerprint, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(ConfigFingerprint(blake3::hash(json.as_bytes()).to_hex().to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity", "must be >= 1"));
        }

        let cls = &self.classifier;
        if !(cls.volatility_multiplier.is_finite() && cls.volatility_multiplier > 0.0) {
            return Err(invalid("classifier.volatility_multiplier", "must be positive"));
        }
        if !(cls.min_volume.is_finite() && cls.min_volume >= 0.0) {
            return Err(invalid("classifier.min_volume", "must be >= 0"));
        }
        for (field, value) in [
            ("classifier.adx_threshold", cls.adx_threshold),
            ("classifier.stagnation_adx_ceiling", cls.stagnation_adx_ceiling),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(field, "must be within [0, 100]"));
            }
        }
        if !(cls.di_margin.is_finite() && cls.di_margin >= 0.0) {
            return Err(invalid("classifier.di_margin", "must be >= 0"));
        }
        if !(cls.stagnation_volume_ratio.is_finite() && cls.stagnation_volume_ratio >= 0.0) {
            return Err(invalid("classifier.stagnation_volume_ratio", "must be >= 0"));
        }
        if cls.hysteresis_periods == 0 {
            return Err(invalid("classifier.hysteresis_periods", "must be >= 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
