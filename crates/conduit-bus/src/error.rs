use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("message bus circuit breaker is open")]
    CircuitOpen,

    #[error("backend store failed: {0}")]
    BackendFailure(String),

    #[error("transaction {0} not found or expired")]
    NotFound(String),
}

pub type BusResult<T> = Result<T, BusError>;

impl From<BusError> for conduit_core::ErrorKind {
    fn from(err: BusError) -> Self {
        match err {
            BusError::CircuitOpen | BusError::BackendFailure(_) => conduit_core::ErrorKind::BusUnavailable,
            BusError::NotFound(_) => conduit_core::ErrorKind::Internal,
        }
    }
}
