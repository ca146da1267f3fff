//! Environment-driven configuration with a strict timeout hierarchy.
//!
//! Loading fails fast on invalid values but never crashes the daemon:
//! callers reach configuration only through [`get_config`], which logs and
//! falls back to [`Config::safe_defaults`] on validation failure.

pub mod env;
pub mod error;
pub mod model;
pub mod timeouts;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::Config;
pub use timeouts::TimeoutHierarchy;

/// Load and validate configuration from the process environment. Never
/// panics and never returns an invalid record: on failure it logs the
/// validation error and returns [`Config::safe_defaults`].
pub fn get_config() -> Config {
    let config = env::RawConfig::from_env().into_config();
    match validate::validate(&config) {
        Ok(()) => config,
        Err(err) => {
            tracing::error!(error = %err, "configuration validation failed, falling back to safe defaults");
            Config::safe_defaults()
        }
    }
}
