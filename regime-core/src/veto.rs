//! Veto engine: regime to priority and allowed actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::classifier::RegimeClassification;
use crate::config::VetoPolicy;
use crate::domain::{Action, Regime, VetoPriority};

/// Veto applied to a symbol for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VetoDecision {
    pub symbol: String,
    /// `None` when the symbol was halted without a classification.
    pub regime: Option<Regime>,
    pub priority: VetoPriority,
    pub allowed: BTreeSet<Action>,
    /// ENTER is allowed only at reduced size.
    pub reduced_entry: bool,
    pub reason: String,
    pub decided_at: DateTime<Utc>,
}

impl VetoDecision {
    pub fn allows(&self, action: Action) -> bool {
        self.allowed.contains(&action)
    }

    /// True when every action is blocked.
    pub fn is_blocking(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// One row of the veto table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VetoRule {
    pub priority: VetoPriority,
    pub allowed: BTreeSet<Action>,
    pub reduced_entry: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VetoEngine {
    policy: VetoPolicy,
}

impl VetoEngine {
    pub fn new(policy: VetoPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &VetoPolicy {
        &self.policy
    }

    fn critical_actions(&self) -> BTreeSet<Action> {
        if self.policy.critical_allows_exit {
            BTreeSet::from([Action::Exit])
        } else {
            BTreeSet::new()
        }
    }

    /// Table lookup for a regime.
    pub fn rule_for(&self, regime: Regime) -> VetoRule {
        match regime {
            Regime::VolatilitySpike | Regime::LowLiquidity => VetoRule {
                priority: VetoPriority::Critical,
                allowed: self.critical_actions(),
                reduced_entry: false,
            },
            Regime::BearTrend => VetoRule {
                priority: VetoPriority::High,
                allowed: BTreeSet::from([Action::Exit]),
                reduced_entry: false,
            },
            Regime::Stagnation => VetoRule {
                priority: VetoPriority::Medium,
                allowed: BTreeSet::from([Action::Enter, Action::Exit]),
                reduced_entry: true,
            },
            Regime::RangeBound | Regime::BullTrend => VetoRule {
                priority: VetoPriority::None,
                allowed: BTreeSet::from([Action::Enter, Action::Exit, Action::Reduce]),
                reduced_entry: false,
            },
        }
    }

    pub fn evaluate(&self, classification: &RegimeClassification) -> VetoDecision {
        let rule = self.rule_for(classification.regime);
        let reason = format_reason(classification, &rule);
        VetoDecision {
            symbol: classification.symbol.clone(),
            regime: Some(classification.regime),
            priority: rule.priority,
            allowed: rule.allowed,
            reduced_entry: rule.reduced_entry,
            reason,
            decided_at: classification.timestamp,
        }
    }

    /// Conservative fallback for a symbol that could not be classified.
    pub fn halt(&self, symbol: &str, cause: &str, at: DateTime<Utc>) -> VetoDecision {
        VetoDecision {
            symbol: symbol.to_string(),
            regime: None,
            priority: VetoPriority::Critical,
            allowed: self.critical_actions(),
            reduced_entry: false,
            reason: format!("{symbol} halted at {}: {cause}", VetoPriority::Critical),
            decided_at: at,
        }
    }
}

fn format_triggers(triggers: &BTreeMap<String, f64>) -> String {
    if triggers.is_empty() {
        return "no indicator triggers".to_string();
    }
    let mut out = String::new();
    for (i, (name, value)) in triggers.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{name}={value:.4}");
    }
    out
}

fn format_reason(c: &RegimeClassification, rule: &VetoRule) -> String {
    let mut reason = format!(
        "{} {} (confidence {:.2}) -> {} veto: {}",
        c.symbol,
        c.regime,
        c.confidence,
        rule.priority,
        format_triggers(&c.triggers)
    );
    if rule.reduced_entry {
        reason.push_str("; entries at reduced size");
    }
    if c.candidate != c.regime {
        let _ = write!(
            reason,
            "; pending {} {}/{}",
            c.candidate, c.confirmations, c.required_confirmations
        );
    }
    reason
}
