use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContinuityError {
    #[error("continuation not found or expired")]
    UnknownContinuation,
}

pub type ContinuityResult<T> = Result<T, ContinuityError>;

impl From<ContinuityError> for conduit_core::ErrorKind {
    fn from(_: ContinuityError) -> Self {
        conduit_core::ErrorKind::UnknownContinuation
    }
}
