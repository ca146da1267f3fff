use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool disabled: {0}")]
    ToolDisabled(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("capability unavailable: {0:?}")]
    CapabilityUnavailable(Vec<String>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ToolResult<T> = Result<T, ToolError>;

impl From<ToolError> for conduit_core::ErrorKind {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::UnknownTool(_) => conduit_core::ErrorKind::UnknownTool,
            ToolError::ToolDisabled(_) => conduit_core::ErrorKind::ToolDisabled,
            ToolError::InvalidArguments(_) => conduit_core::ErrorKind::InvalidInput,
            ToolError::CapabilityUnavailable(_) => conduit_core::ErrorKind::CapabilityUnavailable,
            ToolError::ExecutionFailed(_) | ToolError::Io(_) => conduit_core::ErrorKind::Internal,
        }
    }
}
