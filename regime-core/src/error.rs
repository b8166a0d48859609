//! Error types for snapshot computation and classification.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GuardianError {
    #[error("insufficient data: {required} points required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid indicator value: {name} is not finite ({context})")]
    InvalidIndicatorValue { name: String, context: String },

    #[error("invalid indicator config: {0}")]
    InvalidConfig(String),

    #[error("invalid window: {0}")]
    InvalidWindow(String),

    #[error("stale window for {symbol}: newest point {newest} is not after last evaluation {last}")]
    StaleWindow {
        symbol: String,
        newest: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("{symbol} is already being evaluated")]
    Busy { symbol: String },
}

impl GuardianError {
    /// True when the symbol should be treated as unclassifiable and halted.
    pub fn is_unclassifiable(&self) -> bool {
        matches!(self, Self::InvalidIndicatorValue { .. })
    }
}

pub type Result<T> = std::result::Result<T, GuardianError>;
