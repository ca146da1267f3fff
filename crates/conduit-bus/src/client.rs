use crate::backend::BusBackend;
use crate::breaker::CircuitBreaker;
use crate::error::{BusError, BusResult};
use crate::transaction::Transaction;
use conduit_core::TransactionId;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Either a payload kept in band, or a reference to one persisted
/// out-of-band. Spec §4.3's `route` decision.
pub enum RouteDecision {
    Inline(Vec<u8>),
    Pointer {
        transaction_id: TransactionId,
        size: u64,
        sha256: String,
    },
}

pub struct MessageBusClient {
    backend: Arc<dyn BusBackend>,
    breaker: CircuitBreaker,
    inline_threshold_bytes: u64,
    ttl_secs: u64,
    enabled: bool,
}

impl MessageBusClient {
    pub fn new(backend: Arc<dyn BusBackend>, inline_threshold_bytes: u64, ttl_secs: u64, enabled: bool) -> Self {
        Self {
            backend,
            breaker: CircuitBreaker::new(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN),
            inline_threshold_bytes,
            ttl_secs,
            enabled,
        }
    }

    pub fn breaker_state(&self) -> crate::breaker::CircuitState {
        self.breaker.state()
    }

    /// Decide whether `payload` should be delivered inline or persisted.
    /// Does not itself persist anything; call `store` for that.
    pub fn decide(&self, payload: &[u8]) -> bool {
        payload.len() as u64 >= self.inline_threshold_bytes
    }

    /// Route a payload end to end: decide, and if it needs persisting, do
    /// so through the breaker. Returns `PayloadTooLargeBusDown`-shaped error
    /// (via `BusError::CircuitOpen`) when the payload is oversized and the
    /// bus cannot accept it right now — callers must not silently truncate.
    pub async fn route(&self, payload: Vec<u8>, content_type: &str) -> BusResult<RouteDecision> {
        if !self.decide(&payload) {
            return Ok(RouteDecision::Inline(payload));
        }
        if !self.enabled {
            return Err(BusError::CircuitOpen);
        }
        let txn = self.store(payload, content_type.to_string()).await?;
        Ok(RouteDecision::Pointer {
            transaction_id: txn.id,
            size: txn.size(),
            sha256: txn.sha256,
        })
    }

    pub async fn store(&self, payload: Vec<u8>, content_type: String) -> BusResult<Transaction> {
        if !self.breaker.allow_request() {
            return Err(BusError::CircuitOpen);
        }
        match self.backend.store(payload, content_type, self.ttl_secs).await {
            Ok(txn) => {
                self.breaker.record_success();
                Ok(txn)
            }
            Err(err) => {
                self.breaker.record_failure();
                Err(err)
            }
        }
    }

    pub async fn fetch(&self, id: &TransactionId) -> BusResult<Transaction> {
        if !self.breaker.allow_request() {
            return Err(BusError::CircuitOpen);
        }
        match self.backend.fetch(id).await {
            Ok(txn) => {
                self.breaker.record_success();
                Ok(txn)
            }
            Err(err @ BusError::NotFound(_)) => {
                // A missing row is not a backend fault; don't trip the breaker.
                Err(err)
            }
            Err(err) => {
                self.breaker.record_failure();
                Err(err)
            }
        }
    }

    pub async fn purge(&self) -> BusResult<usize> {
        self.backend.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBusBackend;

    fn client(inline_threshold: u64) -> MessageBusClient {
        MessageBusClient::new(Arc::new(MemoryBusBackend::new()), inline_threshold, 86_400, true)
    }

    #[tokio::test]
    async fn small_payload_routes_inline() {
        let c = client(1024);
        let decision = c.route(vec![0u8; 10], "text/plain").await.unwrap();
        assert!(matches!(decision, RouteDecision::Inline(_)));
    }

    #[tokio::test]
    async fn large_payload_routes_to_pointer_with_matching_sha256() {
        let c = client(16);
        let payload = vec![7u8; 1024];
        let expected_sha = crate::transaction::sha256_hex(&payload);
        let decision = c.route(payload, "application/octet-stream").await.unwrap();
        match decision {
            RouteDecision::Pointer { transaction_id, sha256, .. } => {
                assert_eq!(sha256, expected_sha);
                let fetched = c.fetch(&transaction_id).await.unwrap();
                assert_eq!(crate::transaction::sha256_hex(&fetched.payload), expected_sha);
            }
            RouteDecision::Inline(_) => panic!("expected pointer"),
        }
    }

    #[tokio::test]
    async fn large_payload_fails_when_bus_disabled() {
        let c = MessageBusClient::new(Arc::new(MemoryBusBackend::new()), 16, 86_400, false);
        let err = c.route(vec![1u8; 1024], "text/plain").await.unwrap_err();
        assert!(matches!(err, BusError::CircuitOpen));
    }
}
