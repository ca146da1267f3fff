use crate::event::{ConduitEvent, EventEnvelope};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast bus for internal lifecycle events. Cloning an `EventBus` shares
/// the same underlying sender — every clone publishes to the same set of
/// subscribers, it just gets a fresh handle.
pub struct EventBus {
    sender: broadcast::Sender<Arc<EventEnvelope>>,
    capacity: usize,
}

const DEFAULT_CAPACITY: usize = 256;

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish an event; returns the number of subscribers it was delivered
    /// to (0 is not an error — nothing is listening yet).
    pub fn publish(&self, event: ConduitEvent) -> usize {
        let envelope = Arc::new(EventEnvelope::new(event));
        match self.sender.send(envelope) {
            Ok(n) => n,
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            inner: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

pub struct EventReceiver {
    inner: broadcast::Receiver<Arc<EventEnvelope>>,
}

impl EventReceiver {
    /// Receive the next event, transparently skipping past a `Lagged` error
    /// (logging how many were dropped) rather than surfacing it to callers.
    /// Returns `None` only once the bus itself has been closed.
    pub async fn recv(&mut self) -> Option<Arc<EventEnvelope>> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event receiver lagged, dropping missed events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<Arc<EventEnvelope>> {
        self.inner.try_recv().ok()
    }
}
