//! Persisted classification record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classifier::RegimeClassification;
use crate::config::ConfigFingerprint;
use crate::domain::Regime;
use crate::snapshot::IndicatorSnapshot;

/// One accepted classification, carrying every indicator value it was made from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRecord {
    pub symbol: String,
    pub regime: Regime,
    pub detected_at: DateTime<Utc>,
    pub confidence: f64,
    pub triggers: BTreeMap<String, f64>,
    pub config_fingerprint: ConfigFingerprint,
    pub snapshot: BTreeMap<String, f64>,
}

impl RegimeRecord {
    pub fn new(
        classification: &RegimeClassification,
        snapshot: &IndicatorSnapshot,
        config_fingerprint: ConfigFingerprint,
    ) -> Self {
        Self {
            symbol: classification.symbol.clone(),
            regime: classification.regime,
            detected_at: classification.timestamp,
            confidence: classification.confidence,
            triggers: classification.triggers.clone(),
            config_fingerprint,
            snapshot: snapshot.values.clone(),
        }
    }
}
