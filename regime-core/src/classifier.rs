//! Regime classifier: ordered rule table plus hysteresis.
//!
//! Rules are evaluated top to bottom and the first match becomes the
//! candidate regime. Risk rows sit above opportunity rows. RANGE_BOUND is the
//! default when nothing matches, so classification is total over snapshots.
//!
//! A candidate different from the currently emitted regime is only emitted
//! after it has been the top match for `hysteresis_periods` consecutive
//! evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ClassifierConfig;
use crate::domain::Regime;
use crate::snapshot::{keys, IndicatorSnapshot};

/// Outcome of a single rule that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub confidence: f64,
    pub triggers: BTreeMap<String, f64>,
}

impl RuleMatch {
    fn new(confidence: f64, snapshot: &IndicatorSnapshot, trigger_keys: &[&str]) -> Self {
        let triggers = trigger_keys
            .iter()
            .filter_map(|k| snapshot.get(k).map(|v| (k.to_string(), v)))
            .collect();
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            triggers,
        }
    }
}

pub type RulePredicate = fn(&IndicatorSnapshot, &ClassifierConfig) -> Option<RuleMatch>;

/// One row of the rule table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub regime: Regime,
    pub predicate: RulePredicate,
}

/// The rule table, in evaluation order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "volatility_spike",
        regime: Regime::VolatilitySpike,
        predicate: volatility_spike,
    },
    Rule {
        name: "low_liquidity",
        regime: Regime::LowLiquidity,
        predicate: low_liquidity,
    },
    Rule {
        name: "bull_trend",
        regime: Regime::BullTrend,
        predicate: bull_trend,
    },
    Rule {
        name: "bear_trend",
        regime: Regime::BearTrend,
        predicate: bear_trend,
    },
    Rule {
        name: "stagnation",
        regime: Regime::Stagnation,
        predicate: stagnation,
    },
    Rule {
        name: "range_bound",
        regime: Regime::RangeBound,
        predicate: range_bound,
    },
];

/// Confidence assigned when no rule matches and RANGE_BOUND is the default.
const DEFAULT_CONFIDENCE: f64 = 0.3;

/// Maps how far `value` exceeds `threshold` (relative to `span`) into [0.5, 1.0].
fn strength(value: f64, threshold: f64, span: f64) -> f64 {
    if span <= 0.0 {
        return 1.0;
    }
    0.5 + 0.5 * ((value - threshold) / span).clamp(0.0, 1.0)
}

fn ratio(value: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    match (value, baseline) {
        (Some(v), Some(b)) if b > 0.0 => Some(v / b),
        _ => None,
    }
}

fn volatility_spike(s: &IndicatorSnapshot, c: &ClassifierConfig) -> Option<RuleMatch> {
    let m = c.volatility_multiplier;
    let tr_ratio = ratio(s.get(keys::TRUE_RANGE_RECENT), s.get(keys::TRUE_RANGE_BASELINE))
        .filter(|r| *r > m);
    let width_ratio = ratio(s.get(keys::BOLLINGER_WIDTH), s.get(keys::BOLLINGER_WIDTH_BASELINE))
        .filter(|r| *r > m);

    let mut trigger_keys = Vec::new();
    if tr_ratio.is_some() {
        trigger_keys.extend([keys::TRUE_RANGE_RECENT, keys::TRUE_RANGE_BASELINE, keys::ATR]);
    }
    if width_ratio.is_some() {
        trigger_keys.extend([keys::BOLLINGER_WIDTH, keys::BOLLINGER_WIDTH_BASELINE]);
    }

    let worst = tr_ratio.into_iter().chain(width_ratio).reduce(f64::max)?;
    Some(RuleMatch::new(strength(worst, m, m), s, &trigger_keys))
}

fn low_liquidity(s: &IndicatorSnapshot, c: &ClassifierConfig) -> Option<RuleMatch> {
    let volume = s.get(keys::VOLUME)?;
    let trigger_keys = [keys::VOLUME, keys::VOLUME_FLOOR, keys::VOLUME_BASELINE];

    if volume <= c.min_volume {
        return Some(RuleMatch::new(1.0, s, &trigger_keys));
    }
    let floor = s.get(keys::VOLUME_FLOOR)?;
    if volume < floor {
        return Some(RuleMatch::new(strength(floor - volume, 0.0, floor), s, &trigger_keys));
    }
    None
}

fn directional(s: &IndicatorSnapshot, c: &ClassifierConfig, up: bool) -> Option<RuleMatch> {
    let adx = s.get(keys::ADX)?;
    let plus = s.get(keys::PLUS_DI)?;
    let minus = s.get(keys::MINUS_DI)?;
    let bias = if up { plus - minus } else { minus - plus };

    if adx > c.adx_threshold && bias > c.di_margin {
        let confidence = strength(adx, c.adx_threshold, 100.0 - c.adx_threshold);
        Some(RuleMatch::new(
            confidence,
            s,
            &[keys::ADX, keys::PLUS_DI, keys::MINUS_DI],
        ))
    } else {
        None
    }
}

fn bull_trend(s: &IndicatorSnapshot, c: &ClassifierConfig) -> Option<RuleMatch> {
    directional(s, c, true)
}

fn bear_trend(s: &IndicatorSnapshot, c: &ClassifierConfig) -> Option<RuleMatch> {
    directional(s, c, false)
}

fn stagnation(s: &IndicatorSnapshot, c: &ClassifierConfig) -> Option<RuleMatch> {
    let volume = s.get(keys::VOLUME)?;
    let baseline = s.get(keys::VOLUME_BASELINE)?;
    let adx = s.get(keys::ADX)?;

    if baseline > 0.0
        && volume < c.stagnation_volume_ratio * baseline
        && adx < c.stagnation_adx_ceiling
    {
        let confidence = strength(
            c.stagnation_adx_ceiling - adx,
            0.0,
            c.stagnation_adx_ceiling,
        );
        Some(RuleMatch::new(
            confidence,
            s,
            &[keys::VOLUME, keys::VOLUME_BASELINE, keys::ADX],
        ))
    } else {
        None
    }
}

fn range_bound(s: &IndicatorSnapshot, _c: &ClassifierConfig) -> Option<RuleMatch> {
    let close = s.get(keys::CLOSE)?;
    let upper = s.get(keys::BOLLINGER_UPPER)?;
    let lower = s.get(keys::BOLLINGER_LOWER)?;

    if close < lower || close > upper {
        return None;
    }
    let half_width = (upper - lower) / 2.0;
    let mid = lower + half_width;
    let centered = if half_width > 0.0 {
        1.0 - (close - mid).abs() / half_width
    } else {
        1.0
    };
    Some(RuleMatch::new(
        strength(centered, 0.0, 1.0),
        s,
        &[keys::CLOSE, keys::BOLLINGER_UPPER, keys::BOLLINGER_LOWER],
    ))
}

/// Evaluate the rule table and return the first match (the candidate regime).
pub fn candidate_regime(snapshot: &IndicatorSnapshot, config: &ClassifierConfig) -> (Regime, RuleMatch) {
    RULES
        .iter()
        .find_map(|rule| (rule.predicate)(snapshot, config).map(|m| (rule.regime, m)))
        .unwrap_or_else(|| {
            (
                Regime::RangeBound,
                RuleMatch::new(
                    DEFAULT_CONFIDENCE,
                    snapshot,
                    &[keys::CLOSE, keys::BOLLINGER_UPPER, keys::BOLLINGER_LOWER],
                ),
            )
        })
}

/// Per-symbol hysteresis bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HysteresisState {
    /// Regime most recently emitted; `None` before the first classification.
    pub emitted: Option<Regime>,
    pub emitted_confidence: f64,
    pub emitted_triggers: BTreeMap<String, f64>,
    /// Challenger accumulating confirmations, if any.
    pub candidate: Option<Regime>,
    /// Consecutive evaluations the challenger has been the top match.
    pub counter: u32,
}

/// One classification: the emitted regime plus the candidate that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeClassification {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub regime: Regime,
    pub confidence: f64,
    pub triggers: BTreeMap<String, f64>,
    /// Regime emitted by the previous evaluation.
    pub previous: Option<Regime>,
    /// Top rule match for this evaluation.
    pub candidate: Regime,
    /// Confirmations the pending candidate has accumulated (0 when none pending).
    pub confirmations: u32,
    pub required_confirmations: u32,
}

impl RegimeClassification {
    pub fn is_transition(&self) -> bool {
        self.previous.is_some_and(|p| p != self.regime)
    }

    /// Names of the indicators that triggered the emitted regime.
    pub fn trigger_names(&self) -> Vec<&str> {
        self.triggers.keys().map(String::as_str).collect()
    }
}

/// Maps snapshots to regimes.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: ClassifierConfig,
}

impl RegimeClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a snapshot against the prior hysteresis state.
    ///
    /// Pure: returns the classification and the next state without touching
    /// the input state.
    pub fn classify(
        &self,
        snapshot: &IndicatorSnapshot,
        state: &HysteresisState,
    ) -> (RegimeClassification, HysteresisState) {
        let (candidate, matched) = candidate_regime(snapshot, &self.config);
        let required = self.config.hysteresis_periods.max(1);
        let mut next = state.clone();

        let emit = match state.emitted {
            None => true,
            Some(prev) if prev == candidate => true,
            Some(_) => {
                let count = if state.candidate == Some(candidate) {
                    state.counter.saturating_add(1)
                } else {
                    1
                };
                let escalate = self.config.escalate_immediately && candidate.is_risk();
                if count >= required || escalate {
                    true
                } else {
                    next.candidate = Some(candidate);
                    next.counter = count;
                    false
                }
            }
        };

        let (confidence, triggers) = if emit {
            next.emitted = Some(candidate);
            next.emitted_confidence = matched.confidence;
            next.emitted_triggers = matched.triggers.clone();
            next.candidate = None;
            next.counter = 0;
            (matched.confidence, matched.triggers)
        } else {
            // The held regime loses confidence as the challenger accumulates.
            let progress = next.counter as f64 / required as f64;
            // Same trigger names, values from this snapshot.
            let triggers = state
                .emitted_triggers
                .iter()
                .map(|(name, &held)| (name.clone(), snapshot.get(name).unwrap_or(held)))
                .collect();
            (
                (state.emitted_confidence * (1.0 - progress)).clamp(0.0, 1.0),
                triggers,
            )
        };

        let regime = next.emitted.unwrap_or(candidate);
        tracing::trace!(
            symbol = %snapshot.symbol,
            candidate = %candidate,
            regime = %regime,
            counter = next.counter,
            "classified snapshot"
        );

        let classification = RegimeClassification {
            symbol: snapshot.symbol.clone(),
            timestamp: snapshot.timestamp,
            regime,
            confidence,
            triggers,
            previous: state.emitted,
            candidate,
            confirmations: next.counter,
            required_confirmations: required,
        };
        (classification, next)
    }
}
