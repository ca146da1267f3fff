//! Shared types, opaque ids, the client-facing error taxonomy, and logging
//! bootstrap used by every other crate in the workspace.

pub mod error;
pub mod ids;
pub mod logging;
pub mod time;

pub use error::{ClientError, CoreError, ErrorKind};
pub use ids::{ConnectionId, ContinuationId, CorrelationId, RequestId, SessionId, TransactionId, WorkflowId};
