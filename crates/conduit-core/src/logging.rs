//! Structured logging setup, shared by the daemon and the CLI.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global `tracing` subscriber. Safe to call more than once
/// per process in tests; later calls are no-ops because
/// `tracing_subscriber::fmt().try_init()` refuses to replace an existing
/// global subscriber.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already initialised");
    }
}
