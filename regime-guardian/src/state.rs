//! Per-symbol guardian state.
//!
//! - `DashMap`: per-symbol sharding, different symbols don't block each other
//! - `parking_lot::Mutex`: serialises evaluations of the same symbol
//!
//! The map shard lock is only held while fetching a symbol's slot, never
//! while its mutex is held.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use regime_core::classifier::HysteresisState;
use regime_core::Regime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything the guardian remembers about one symbol between evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardianState {
    pub hysteresis: HysteresisState,
    /// Newest timestamp of the last accepted window.
    pub last_evaluated: Option<DateTime<Utc>>,
    pub evaluations: u64,
}

impl GuardianState {
    pub fn regime(&self) -> Option<Regime> {
        self.hysteresis.emitted
    }
}

pub type StateSlot = Arc<Mutex<GuardianState>>;

#[derive(Debug, Default)]
pub struct StateStore {
    states: DashMap<String, StateSlot>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The symbol's slot, created empty on first use.
    pub fn slot(&self, symbol: &str) -> StateSlot {
        if let Some(slot) = self.states.get(symbol) {
            return Arc::clone(slot.value());
        }
        Arc::clone(
            self.states
                .entry(symbol.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(GuardianState::default())))
                .value(),
        )
    }

    /// Copy of a symbol's state, if it has one.
    pub fn get(&self, symbol: &str) -> Option<GuardianState> {
        let slot = self.states.get(symbol).map(|s| Arc::clone(s.value()))?;
        let state = slot.lock().clone();
        Some(state)
    }

    /// Replace the state of each given symbol.
    pub fn restore(&self, states: impl IntoIterator<Item = (String, GuardianState)>) {
        for (symbol, state) in states {
            let slot = self.slot(&symbol);
            *slot.lock() = state;
        }
    }

    /// Copy of every symbol's state.
    pub fn export(&self) -> BTreeMap<String, GuardianState> {
        let slots: Vec<(String, StateSlot)> = self
            .states
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        slots
            .into_iter()
            .map(|(symbol, slot)| {
                let state = slot.lock().clone();
                (symbol, state)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> GuardianState {
        GuardianState {
            hysteresis: HysteresisState {
                emitted: Some(Regime::BearTrend),
                emitted_confidence: 0.7,
                candidate: Some(Regime::RangeBound),
                counter: 2,
                ..HysteresisState::default()
            },
            last_evaluated: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
            evaluations: 9,
        }
    }

    #[test]
    fn unknown_symbol_has_no_state() {
        let store = StateStore::new();
        assert_eq!(store.get("BTC"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn slot_is_shared_per_symbol() {
        let store = StateStore::new();
        let a = store.slot("BTC");
        let b = store.slot("BTC");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &store.slot("ETH")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn restore_then_export() {
        let store = StateStore::new();
        store.restore([("BTC".to_string(), sample())]);
        assert_eq!(store.get("BTC"), Some(sample()));
        assert_eq!(store.get("BTC").and_then(|s| s.regime()), Some(Regime::BearTrend));

        let exported = store.export();
        assert_eq!(exported.len(), 1);
        assert_eq!(exported["BTC"], sample());
    }

    #[test]
    fn state_survives_json() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: GuardianState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
    }
}
