//! Regime core: indicators, snapshots, regime classification and veto table.
//!
//! - Domain types (price points, regimes, veto priorities, actions)
//! - Indicator set and the snapshot engine that evaluates it over a window
//! - Ordered rule-table classifier with hysteresis
//! - Table-driven veto engine
//! - Configuration, fingerprinting and persisted classification records

pub mod classifier;
pub mod config;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod record;
pub mod snapshot;
pub mod veto;

pub use classifier::{HysteresisState, RegimeClassification, RegimeClassifier};
pub use config::{
    ClassifierConfig, ConfigError, ConfigFingerprint, GuardianConfig, HistoryConfig,
    IndicatorConfig, VetoPolicy,
};
pub use domain::{Action, PricePoint, Regime, VetoPriority};
pub use error::{GuardianError, Result};
pub use record::RegimeRecord;
pub use snapshot::{compute_snapshot, IndicatorEngine, IndicatorSnapshot};
pub use veto::{VetoDecision, VetoEngine};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the guardian shares across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PricePoint>();
        require_sync::<PricePoint>();
        require_send::<IndicatorSnapshot>();
        require_sync::<IndicatorSnapshot>();
        require_send::<IndicatorEngine>();
        require_sync::<IndicatorEngine>();
        require_send::<RegimeClassifier>();
        require_sync::<RegimeClassifier>();
        require_send::<HysteresisState>();
        require_sync::<HysteresisState>();
        require_send::<VetoEngine>();
        require_sync::<VetoEngine>();
        require_send::<VetoDecision>();
        require_sync::<VetoDecision>();
        require_send::<RegimeRecord>();
        require_sync::<RegimeRecord>();
        require_send::<GuardianError>();
        require_sync::<GuardianError>();
    }
}
