//! Provider-related error types.

use thiserror::Error;

/// Errors that can occur with LLM provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API key not configured for {provider}")]
    ApiKeyNotConfigured { provider: String },

    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Model not supported: {model}")]
    ModelNotSupported { model: String },

    #[error("Context length exceeded: {current} tokens, max is {max}")]
    ContextLengthExceeded { current: usize, max: usize },

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("No model available satisfying required capabilities: {0:?}")]
    CapabilityUnavailable(Vec<String>),

    #[error("No available model in tier {0:?}")]
    TierExhausted(crate::tier::Tier),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Retriable per spec §4.4: network, 5xx, timeout. Everything else
    /// (auth, invalid request, model-not-found) is terminal and triggers
    /// escalation instead of a retry of the same model.
    pub fn is_retriable(&self) -> bool {
        match self {
            ProviderError::RateLimitExceeded { .. } => true,
            ProviderError::HttpError(e) => e.is_timeout() || e.status().map(|s| s.is_server_error()).unwrap_or(true),
            ProviderError::ApiKeyNotConfigured { .. }
            | ProviderError::ModelNotSupported { .. }
            | ProviderError::InvalidResponse(_)
            | ProviderError::ContextLengthExceeded { .. }
            | ProviderError::CapabilityUnavailable(_)
            | ProviderError::TierExhausted(_)
            | ProviderError::ApiRequestFailed(_) => false,
        }
    }
}

impl From<ProviderError> for conduit_core::ErrorKind {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CapabilityUnavailable(_) => conduit_core::ErrorKind::CapabilityUnavailable,
            _ => conduit_core::ErrorKind::ProviderError,
        }
    }
}
