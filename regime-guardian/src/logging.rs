//! Logging initialization.
//!
//! - JSON: structured logs for log aggregation
//! - Plain: human-readable logs for development
//!
//! The filter comes from `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt, util::TryInitError,
    EnvFilter, Layer,
};

fn subscriber(json: bool) -> impl tracing::Subscriber + Send + Sync + 'static {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let format = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stdout)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stdout)
            .boxed()
    };

    Registry::default().with(env_filter).with(format)
}

/// Install the global subscriber. Panics if one is already installed.
pub fn init_logging(json: bool) {
    subscriber(json).init();
}

/// Install the global subscriber unless one already exists.
pub fn try_init_logging(json: bool) -> Result<(), TryInitError> {
    subscriber(json).try_init()
}
