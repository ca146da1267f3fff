use chrono::{DateTime, Utc};
use conduit_core::TransactionId;
use serde::{Deserialize, Serialize};

/// A persisted payload. Immutable once written; consumption (`fetch`) is
/// idempotent — reading twice within the TTL returns the same bytes and
/// does not delete the row, matching spec §4.3 and §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub payload: Vec<u8>,
    pub content_type: String,
    pub sha256: String,
    pub created_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub ttl_expires_at: DateTime<Utc>,
}

impl Transaction {
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.ttl_expires_at
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
