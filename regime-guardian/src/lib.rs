//! Regime guardian: per-symbol evaluation over the regime core.
//!
//! - [`RegimeGuardian`]: evaluation entry point, owns per-symbol hysteresis state
//! - [`StateStore`]: sharded per-symbol state with per-symbol locks
//! - [`ClassificationStore`]: history collaborator, in-memory and JSONL
//! - [`logging`]: subscriber initialisation

pub mod guardian;
pub mod history;
pub mod logging;
pub mod state;

pub use guardian::{Evaluation, EvaluationRequest, RegimeGuardian};
pub use history::{ClassificationStore, HistoryError, InMemoryHistory, JsonlHistory};
pub use state::{GuardianState, StateStore};

pub use regime_core;
