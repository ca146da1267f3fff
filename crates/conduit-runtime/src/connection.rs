use crate::error::{RuntimeError, RuntimeResult};
use conduit_core::ConnectionId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

/// A live transport connection (spec §4.9), distinct from the `Session` it
/// is attached to — a session's identity survives reconnects, a
/// connection's concurrency gate does not.
pub struct Connection {
    pub id: ConnectionId,
    in_flight: AtomicU64,
    semaphore: Semaphore,
}

impl Connection {
    fn new(concurrency_max: usize) -> Self {
        Self {
            id: ConnectionId::new(),
            in_flight: AtomicU64::new(0),
            semaphore: Semaphore::new(concurrency_max),
        }
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// A held slot in a connection's concurrency gate. Released on drop, the
/// same discipline as `SessionPermit`.
pub struct ConnectionPermit<'a> {
    connection: &'a Connection,
    _permit: tokio::sync::SemaphorePermit<'a>,
}

impl Drop for ConnectionPermit<'_> {
    fn drop(&mut self) {
        self.connection.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Tracks live connections and their per-connection concurrency gate
/// (spec §4.9's "apply two semaphores (per-connection and per-session)").
/// Mirrors `SessionManager`'s registry shape but carries no auth or TTL
/// concerns of its own — a connection's lifetime is driven by `hello`
/// (open) and the transport closing (close), not an idle sweep.
pub struct ConnectionManager {
    connections: RwLock<HashMap<String, Arc<Connection>>>,
    concurrency_max: usize,
}

impl ConnectionManager {
    pub fn new(concurrency_max: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            concurrency_max,
        }
    }

    pub async fn open(&self) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(self.concurrency_max));
        self.connections
            .write()
            .await
            .insert(connection.id.as_str().to_string(), connection.clone());
        connection
    }

    pub async fn get(&self, id: &ConnectionId) -> RuntimeResult<Arc<Connection>> {
        self.connections
            .read()
            .await
            .get(id.as_str())
            .cloned()
            .ok_or(RuntimeError::AuthFailed)
    }

    /// Guards per-connection in-flight count against `concurrency_max`.
    /// Returns `Busy` immediately on contention rather than blocking — same
    /// non-queueing default as `SessionManager::acquire`.
    pub async fn acquire<'a>(&self, connection: &'a Connection) -> RuntimeResult<ConnectionPermit<'a>> {
        let permit = connection.semaphore.try_acquire().map_err(|_| RuntimeError::Busy)?;
        connection.in_flight.fetch_add(1, Ordering::AcqRel);
        Ok(ConnectionPermit { connection, _permit: permit })
    }

    /// Waits for a slot rather than failing immediately — same admit-then-wait
    /// contract as `SessionManager::acquire_waiting`.
    pub async fn acquire_waiting<'a>(&self, connection: &'a Connection) -> ConnectionPermit<'a> {
        let permit = connection.semaphore.acquire().await.expect("connection semaphore never closed");
        connection.in_flight.fetch_add(1, Ordering::AcqRel);
        ConnectionPermit { connection, _permit: permit }
    }

    pub async fn close(&self, id: &ConnectionId) {
        self.connections.write().await.remove(id.as_str());
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_registers_a_connection() {
        let mgr = ConnectionManager::new(2);
        let conn = mgr.open().await;
        assert_eq!(mgr.connection_count().await, 1);
        assert!(mgr.get(&conn.id).await.is_ok());
    }

    #[tokio::test]
    async fn acquire_respects_concurrency_max() {
        let mgr = ConnectionManager::new(2);
        let conn = mgr.open().await;
        let _p1 = mgr.acquire(&conn).await.unwrap();
        let _p2 = mgr.acquire(&conn).await.unwrap();
        assert!(matches!(mgr.acquire(&conn).await, Err(RuntimeError::Busy)));
    }

    #[tokio::test]
    async fn releasing_a_permit_frees_the_slot() {
        let mgr = ConnectionManager::new(1);
        let conn = mgr.open().await;
        {
            let _p = mgr.acquire(&conn).await.unwrap();
            assert_eq!(conn.in_flight(), 1);
        }
        assert_eq!(conn.in_flight(), 0);
        assert!(mgr.acquire(&conn).await.is_ok());
    }

    #[tokio::test]
    async fn acquire_waiting_unblocks_once_a_slot_frees_up() {
        let mgr = ConnectionManager::new(1);
        let conn = mgr.open().await;
        let first = mgr.acquire(&conn).await.unwrap();
        let waiter = tokio::spawn(async move {
            let conn = conn;
            mgr.acquire_waiting(&conn).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(!waiter.is_finished());
        drop(first);
        tokio::time::timeout(std::time::Duration::from_millis(50), waiter).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn close_removes_the_connection() {
        let mgr = ConnectionManager::new(1);
        let conn = mgr.open().await;
        mgr.close(&conn.id).await;
        assert!(mgr.get(&conn.id).await.is_err());
    }
}
