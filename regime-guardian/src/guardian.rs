//! The regime guardian: per-symbol evaluation entry point.
//!
//! Each evaluation runs four phases:
//! 1. Compute the indicator snapshot (pure, no lock held)
//! 2. Lock the symbol's state, classify, update hysteresis, unlock
//! 3. Evaluate the veto
//! 4. Hand the classification record to the history store (no lock held)

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rayon::prelude::*;
use regime_core::classifier::{RegimeClassification, RegimeClassifier};
use regime_core::{
    ConfigError, ConfigFingerprint, GuardianConfig, GuardianError, IndicatorEngine,
    IndicatorSnapshot, PricePoint, RegimeRecord, Result, VetoDecision, VetoEngine,
};
use tracing::{debug, info, warn};

use crate::history::{ClassificationStore, HistoryError, InMemoryHistory};
use crate::state::{GuardianState, StateStore};

/// Everything produced by one accepted evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub decision: VetoDecision,
    pub classification: RegimeClassification,
    pub snapshot: IndicatorSnapshot,
}

/// One entry of a batch evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub symbol: String,
    pub window: Vec<PricePoint>,
}

impl EvaluationRequest {
    pub fn new(symbol: impl Into<String>, window: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            window,
        }
    }
}

pub struct RegimeGuardian {
    config: GuardianConfig,
    fingerprint: ConfigFingerprint,
    engine: IndicatorEngine,
    classifier: RegimeClassifier,
    veto: VetoEngine,
    states: StateStore,
    history: Arc<dyn ClassificationStore>,
}

impl RegimeGuardian {
    /// Build a guardian over a validated configuration and a history store.
    pub fn new(
        config: GuardianConfig,
        history: Arc<dyn ClassificationStore>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let fingerprint = config.fingerprint()?;
        info!(
            fingerprint = %fingerprint,
            required_points = config.indicators.required_points(),
            "regime guardian configured"
        );
        Ok(Self {
            engine: IndicatorEngine::new(&config.indicators),
            classifier: RegimeClassifier::new(config.classifier.clone()),
            veto: VetoEngine::new(config.veto.clone()),
            states: StateStore::new(),
            history,
            fingerprint,
            config,
        })
    }

    /// Guardian with an in-memory history sized by `config.history.capacity`.
    pub fn in_memory(config: GuardianConfig) -> std::result::Result<Self, ConfigError> {
        let history = Arc::new(InMemoryHistory::new(config.history.capacity));
        Self::new(config, history)
    }

    pub fn config(&self) -> &GuardianConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &ConfigFingerprint {
        &self.fingerprint
    }

    /// Minimum window length accepted by `evaluate`.
    pub fn required_points(&self) -> usize {
        self.engine.required_points()
    }

    /// Evaluate a symbol's window and return its veto decision.
    pub fn evaluate(&self, symbol: &str, window: &[PricePoint]) -> Result<VetoDecision> {
        self.evaluate_detailed(symbol, window).map(|e| e.decision)
    }

    /// Like [`evaluate`](Self::evaluate), also returning the classification
    /// and the snapshot it was made from.
    pub fn evaluate_detailed(&self, symbol: &str, window: &[PricePoint]) -> Result<Evaluation> {
        let snapshot = self.snapshot(symbol, window)?;
        let slot = self.states.slot(symbol);
        let classification = {
            let mut state = slot.lock();
            self.classify_locked(&snapshot, &mut state)?
        };
        Ok(self.finish(snapshot, classification))
    }

    /// Non-blocking variant: fails with `Busy` instead of waiting when the
    /// symbol is already being evaluated.
    pub fn try_evaluate(&self, symbol: &str, window: &[PricePoint]) -> Result<VetoDecision> {
        let snapshot = self.snapshot(symbol, window)?;
        let slot = self.states.slot(symbol);
        let classification = {
            let Some(mut state) = slot.try_lock() else {
                return Err(self.rejected(GuardianError::Busy {
                    symbol: symbol.to_string(),
                }));
            };
            self.classify_locked(&snapshot, &mut state)?
        };
        Ok(self.finish(snapshot, classification).decision)
    }

    /// Evaluate, converting an unclassifiable window into a CRITICAL halt.
    ///
    /// Other errors still propagate.
    pub fn evaluate_or_halt(&self, symbol: &str, window: &[PricePoint]) -> Result<VetoDecision> {
        match self.evaluate(symbol, window) {
            Err(e) if e.is_unclassifiable() => {
                let at = window.last().map_or_else(Utc::now, |p| p.timestamp);
                Ok(self.veto.halt(symbol, &e.to_string(), at))
            }
            other => other,
        }
    }

    /// Evaluate many requests in parallel. Results are in request order.
    ///
    /// Requests for the same symbol are serialised by its lock; their relative
    /// order is unspecified, so a later window may reject an earlier one as
    /// stale.
    pub fn evaluate_batch(&self, requests: &[EvaluationRequest]) -> Vec<Result<VetoDecision>> {
        requests
            .par_iter()
            .map(|r| self.evaluate(&r.symbol, &r.window))
            .collect()
    }

    /// Up to `n` most recent classification records for a symbol, oldest first.
    pub fn recent_classifications(
        &self,
        symbol: &str,
        n: usize,
    ) -> std::result::Result<Vec<RegimeRecord>, HistoryError> {
        self.history.recent(symbol, n)
    }

    pub fn state(&self, symbol: &str) -> Option<GuardianState> {
        self.states.get(symbol)
    }

    pub fn restore_states(&self, states: impl IntoIterator<Item = (String, GuardianState)>) {
        self.states.restore(states);
    }

    pub fn export_states(&self) -> BTreeMap<String, GuardianState> {
        self.states.export()
    }

    // ── Phases ───────────────────────────────────────────────────────

    fn snapshot(&self, symbol: &str, window: &[PricePoint]) -> Result<IndicatorSnapshot> {
        let snapshot = self.engine.compute(window).map_err(|e| self.rejected(e))?;
        if snapshot.symbol != symbol {
            return Err(self.rejected(GuardianError::InvalidWindow(format!(
                "window belongs to {}, not {symbol}",
                snapshot.symbol
            ))));
        }
        Ok(snapshot)
    }

    fn classify_locked(
        &self,
        snapshot: &IndicatorSnapshot,
        state: &mut GuardianState,
    ) -> Result<RegimeClassification> {
        if let Some(last) = state.last_evaluated {
            if snapshot.timestamp <= last {
                return Err(self.rejected(GuardianError::StaleWindow {
                    symbol: snapshot.symbol.clone(),
                    newest: snapshot.timestamp,
                    last,
                }));
            }
        }

        let (classification, next) = self.classifier.classify(snapshot, &state.hysteresis);
        state.hysteresis = next;
        state.last_evaluated = Some(snapshot.timestamp);
        state.evaluations += 1;
        Ok(classification)
    }

    fn finish(&self, snapshot: IndicatorSnapshot, classification: RegimeClassification) -> Evaluation {
        let c = &classification;
        debug!(
            symbol = %c.symbol,
            regime = %c.regime,
            candidate = %c.candidate,
            confidence = c.confidence,
            confirmations = c.confirmations,
            "classified"
        );
        if c.is_transition() {
            info!(
                symbol = %c.symbol,
                from = ?c.previous,
                to = %c.regime,
                triggers = ?c.triggers,
                "regime transition"
            );
        }

        let decision = self.veto.evaluate(c);
        let record = RegimeRecord::new(c, &snapshot, self.fingerprint.clone());
        if let Err(e) = self.history.append(&record) {
            warn!(symbol = %c.symbol, error = %e, "failed to append classification history");
        }

        Evaluation {
            decision,
            classification,
            snapshot,
        }
    }

    fn rejected(&self, err: GuardianError) -> GuardianError {
        warn!(error = %err, "window rejected");
        err
    }
}
