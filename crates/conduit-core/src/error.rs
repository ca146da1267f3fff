//! Client-facing error taxonomy.
//!
//! Every crate in the workspace defines its own `thiserror` error type for
//! its internal failure modes. This module is the single place those types
//! get collapsed into the kinds a client is actually allowed to see, so the
//! daemon never has to match on a downstream crate's error enum directly.

use crate::ids::CorrelationId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    UnknownTool,
    ToolDisabled,
    AuthFailed,
    Busy,
    Timeout,
    ProviderError,
    CapabilityUnavailable,
    BusUnavailable,
    PayloadTooLarge,
    PayloadTooLargeBusDown,
    WorkflowOrderError,
    UnknownContinuation,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Whether this kind should ever be retried by the caller without
    /// changing the request. Used by frames deciding whether to surface an
    /// error immediately or attempt escalation first.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ErrorKind::Busy | ErrorKind::BusUnavailable)
    }
}

/// The shape serialised into an outbound `{status: error, ...}` envelope.
/// Never carries a stack trace or a secret; `message` is meant for humans,
/// `kind` is meant for callers that branch on it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,
    pub request_id: Option<String>,
    pub correlation_id: CorrelationId,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, correlation_id: CorrelationId) -> Self {
        Self {
            kind,
            message: message.into(),
            request_id: None,
            correlation_id,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Raised by invariant checks inside conduit-core itself (id validation,
/// time arithmetic). Small on purpose — most errors belong to their owning
/// crate and convert into `ErrorKind` at the boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<CoreError> for ErrorKind {
    fn from(_: CoreError) -> Self {
        ErrorKind::Internal
    }
}
