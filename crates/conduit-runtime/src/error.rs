use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("authentication failed")]
    AuthFailed,

    #[error("session concurrency limit reached")]
    Busy,

    #[error("tool exceeded its timeout budget")]
    Timeout,

    #[error("workflow step ordering violated: expected {expected}, got {got}")]
    WorkflowOrderError { expected: u32, got: u32 },

    #[error("payload too large and message bus is down")]
    PayloadTooLargeBusDown,

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Tool(#[from] conduit_tools::ToolError),

    #[error(transparent)]
    Provider(#[from] conduit_providers::ProviderError),

    #[error(transparent)]
    Continuity(#[from] conduit_continuity::ContinuityError),

    #[error(transparent)]
    Bus(#[from] conduit_bus::BusError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<RuntimeError> for conduit_core::ErrorKind {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::InvalidInput(_) => conduit_core::ErrorKind::InvalidInput,
            RuntimeError::AuthFailed => conduit_core::ErrorKind::AuthFailed,
            RuntimeError::Busy => conduit_core::ErrorKind::Busy,
            RuntimeError::Timeout => conduit_core::ErrorKind::Timeout,
            RuntimeError::WorkflowOrderError { .. } => conduit_core::ErrorKind::WorkflowOrderError,
            RuntimeError::PayloadTooLargeBusDown => conduit_core::ErrorKind::PayloadTooLargeBusDown,
            RuntimeError::Cancelled => conduit_core::ErrorKind::Cancelled,
            RuntimeError::Tool(e) => e.into(),
            RuntimeError::Provider(e) => e.into(),
            RuntimeError::Continuity(e) => e.into(),
            RuntimeError::Bus(e) => e.into(),
        }
    }
}
