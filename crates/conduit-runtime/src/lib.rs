//! Request dispatch runtime: sessions, argument validation, the response
//! envelope, and the simple/workflow tool frames that produce it.

pub mod connection;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod schema;
pub mod session;

pub use connection::{Connection, ConnectionManager, ConnectionPermit};
pub use envelope::{FrameEnvelope, UsageSummary};
pub use error::{RuntimeError, RuntimeResult};
pub use frame::{Confidence, Phase, SimpleRequest, SimpleToolFrame, WorkflowEngine, WorkflowState, WorkflowStepArgs};
pub use schema::validate_arguments;
pub use session::{spawn_sweeper, Session, SessionManager, SessionPermit};
