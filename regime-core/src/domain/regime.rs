//! Regime labels, veto priorities and trading actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Market regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    /// Volatility well above its recent baseline.
    VolatilitySpike,
    /// Volume below the liquidity floor.
    LowLiquidity,
    /// Strong directional trend upward.
    BullTrend,
    /// Strong directional trend downward.
    BearTrend,
    /// Little volume and no trend.
    Stagnation,
    /// Price oscillating inside its envelope.
    RangeBound,
}

impl Regime {
    pub const ALL: [Regime; 6] = [
        Regime::VolatilitySpike,
        Regime::LowLiquidity,
        Regime::BullTrend,
        Regime::BearTrend,
        Regime::Stagnation,
        Regime::RangeBound,
    ];

    /// Stable label used in reasons and persisted records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VolatilitySpike => "VOLATILITY_SPIKE",
            Self::LowLiquidity => "LOW_LIQUIDITY",
            Self::BullTrend => "BULL_TREND",
            Self::BearTrend => "BEAR_TREND",
            Self::Stagnation => "STAGNATION",
            Self::RangeBound => "RANGE_BOUND",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::VolatilitySpike => "Sudden increase in market volatility",
            Self::LowLiquidity => "Reduced market liquidity",
            Self::BullTrend => "Strong upward trend",
            Self::BearTrend => "Strong downward trend",
            Self::Stagnation => "Little to no market movement",
            Self::RangeBound => "Market moving within a defined range",
        }
    }

    /// Risk regimes are checked ahead of opportunity regimes.
    pub fn is_risk(&self) -> bool {
        matches!(self, Self::VolatilitySpike | Self::LowLiquidity)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Veto severity tier. Declaration order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VetoPriority {
    None,
    Medium,
    High,
    Critical,
}

impl VetoPriority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for VetoPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Trading action that a veto decision may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Enter,
    Exit,
    Reduce,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enter => "ENTER",
            Self::Exit => "EXIT",
            Self::Reduce => "REDUCE",
        })
    }
}
