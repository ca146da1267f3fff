//! Internal broadcast bus carrying session and workflow lifecycle events
//! between components that would otherwise need a direct reference to each
//! other — the session sweep publishes `SessionClosed`, the WebSocket
//! server subscribes to push it to whatever connection is still attached.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventReceiver};
pub use event::{ConduitEvent, EventEnvelope, SessionCloseReason};
