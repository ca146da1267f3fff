use chrono::{DateTime, Utc};
use conduit_core::{ConnectionId, SessionId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Internal lifecycle notifications, published onto the bus as components
/// complete work. These are not the wire protocol envelopes of spec §6 —
/// they are what the daemon logs, and what the WebSocket server consults to
/// push unsolicited notifications (e.g. a sweep closing an idle session)
/// to whichever connection is still attached.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConduitEvent {
    SessionOpened {
        session_id: SessionId,
    },
    SessionClosed {
        session_id: SessionId,
        reason: SessionCloseReason,
    },
    ConnectionAttached {
        connection_id: ConnectionId,
        session_id: SessionId,
    },
    ConnectionDetached {
        connection_id: ConnectionId,
        session_id: SessionId,
    },
    WorkflowPaused {
        workflow_id: WorkflowId,
        step_number: u32,
    },
    WorkflowCompleted {
        workflow_id: WorkflowId,
    },
    WorkflowCancelled {
        workflow_id: WorkflowId,
    },
    CircuitBreakerOpened {
        backend: String,
    },
    CircuitBreakerClosed {
        backend: String,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionCloseReason {
    ClientClose,
    IdleExpiry,
    AuthRevoked,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event: ConduitEvent,
    pub emitted_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn new(event: ConduitEvent) -> Self {
        Self {
            event,
            emitted_at: Utc::now(),
        }
    }
}
