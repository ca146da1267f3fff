use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    ValidationError { field: &'static str, message: String },

    #[error("timeout ordering violated: {lesser} ({lesser_secs}s) must be less than {greater} ({greater_secs}s)")]
    TimeoutOrderViolation {
        lesser: &'static str,
        lesser_secs: u64,
        greater: &'static str,
        greater_secs: u64,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
