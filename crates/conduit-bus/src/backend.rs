use crate::error::{BusError, BusResult};
use crate::transaction::{sha256_hex, Transaction};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use conduit_core::TransactionId;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// The out-of-scope external collaborator from spec §1: "a relational
/// service exposing row insert, row fetch-by-id, TTL cleanup, and atomic
/// counters with row-level security". This trait is the seam; a real
/// deployment implements it against that service. The daemon itself only
/// ever talks to the trait, the same way the teacher's storage layer talks
/// to `KvStore` rather than `SurrealKvStore` directly.
#[async_trait]
pub trait BusBackend: Send + Sync + 'static {
    async fn store(&self, payload: Vec<u8>, content_type: String, ttl_secs: u64) -> BusResult<Transaction>;
    async fn fetch(&self, id: &TransactionId) -> BusResult<Transaction>;
    async fn purge_expired(&self) -> BusResult<usize>;
}

/// In-memory backend: the default for a single-daemon deployment and the
/// test double for everything else in this crate.
#[derive(Default)]
pub struct MemoryBusBackend {
    rows: RwLock<HashMap<String, Transaction>>,
}

impl MemoryBusBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BusBackend for MemoryBusBackend {
    async fn store(&self, payload: Vec<u8>, content_type: String, ttl_secs: u64) -> BusResult<Transaction> {
        let now = Utc::now();
        let txn = Transaction {
            id: TransactionId::new(),
            sha256: sha256_hex(&payload),
            content_type,
            created_at: now,
            consumed_at: None,
            ttl_expires_at: now + ChronoDuration::seconds(ttl_secs as i64),
            payload,
        };
        let mut rows = self.rows.write().await;
        rows.insert(txn.id.as_str().to_string(), txn.clone());
        Ok(txn)
    }

    async fn fetch(&self, id: &TransactionId) -> BusResult<Transaction> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let txn = rows
            .get_mut(id.as_str())
            .ok_or_else(|| BusError::NotFound(id.as_str().to_string()))?;
        if txn.is_expired(now) {
            rows.remove(id.as_str());
            return Err(BusError::NotFound(id.as_str().to_string()));
        }
        if txn.consumed_at.is_none() {
            txn.consumed_at = Some(now);
        }
        Ok(txn.clone())
    }

    async fn purge_expired(&self) -> BusResult<usize> {
        let now = Utc::now();
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, txn| !txn.is_expired(now));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_fetch_roundtrips() {
        let backend = MemoryBusBackend::new();
        let txn = backend.store(b"hello".to_vec(), "text/plain".into(), 60).await.unwrap();
        let fetched = backend.fetch(&txn.id).await.unwrap();
        assert_eq!(fetched.payload, b"hello");
        assert_eq!(fetched.sha256, txn.sha256);
    }

    #[tokio::test]
    async fn fetch_is_idempotent() {
        let backend = MemoryBusBackend::new();
        let txn = backend.store(b"data".to_vec(), "text/plain".into(), 60).await.unwrap();
        let first = backend.fetch(&txn.id).await.unwrap();
        let second = backend.fetch(&txn.id).await.unwrap();
        assert_eq!(first.payload, second.payload);
        assert_eq!(first.consumed_at, second.consumed_at);
    }

    #[tokio::test]
    async fn fetch_unknown_id_fails() {
        let backend = MemoryBusBackend::new();
        let err = backend.fetch(&TransactionId::new()).await.unwrap_err();
        assert!(matches!(err, BusError::NotFound(_)));
    }

    #[tokio::test]
    async fn purge_removes_expired_rows() {
        let backend = MemoryBusBackend::new();
        let txn = backend.store(b"x".to_vec(), "text/plain".into(), 0).await.unwrap();
        // ttl_secs = 0 means already expired relative to "now" on the next check
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let purged = backend.purge_expired().await.unwrap();
        assert_eq!(purged, 1);
        assert!(backend.fetch(&txn.id).await.is_err());
    }
}
