//! PricePoint: one OHLCV observation for a symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV observation for a single symbol at a single timestamp.
///
/// Supplied by the market-data collaborator as an ordered window, oldest
/// first. A missing volume deserializes as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl PricePoint {
    /// Returns the name of the first non-finite field, if any.
    ///
    /// Negative volume is reported as well since it cannot come from a
    /// real tape.
    pub fn invalid_field(&self) -> Option<&'static str> {
        if !self.open.is_finite() {
            Some("open")
        } else if !self.high.is_finite() {
            Some("high")
        } else if !self.low.is_finite() {
            Some("low")
        } else if !self.close.is_finite() {
            Some("close")
        } else if !self.volume.is_finite() || self.volume < 0.0 {
            Some("volume")
        } else {
            None
        }
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if self.invalid_field().is_some() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
