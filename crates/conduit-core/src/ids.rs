//! Opaque, cryptographically random identifiers.
//!
//! Every id handed to a client (session, connection, continuation,
//! transaction, workflow, correlation) is generated the same way: 16 bytes
//! from the OS RNG, base64 URL-safe with no padding. That is 128 bits of
//! entropy and a string safe to embed in a URL or a JSON string without
//! escaping.

use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

const ID_BYTES: usize = 16;

fn random_id() -> String {
    let mut bytes = [0u8; ID_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

macro_rules! opaque_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(random_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True iff the id looks like base64-url (no padding, no `+`/`/`).
            /// Used by id-entropy property tests, not by normal code paths.
            pub fn is_url_safe(&self) -> bool {
                self.0
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

opaque_id!(SessionId, "sess_");
opaque_id!(ConnectionId, "conn_");
opaque_id!(ContinuationId, "cont_");
opaque_id!(TransactionId, "txn_");
opaque_id!(WorkflowId, "wf_");
opaque_id!(CorrelationId, "corr_");
opaque_id!(RequestId, "req_");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_are_url_safe() {
        for _ in 0..200 {
            assert!(SessionId::new().is_url_safe());
        }
    }

    #[test]
    fn ids_carry_at_least_128_bits() {
        // base64 with no padding over 16 bytes is 22 chars; a collision here
        // would mean the RNG is broken, not that the encoding is too short.
        let id = SessionId::new();
        assert!(id.as_str().len() >= 22);
    }

    #[test]
    fn display_includes_prefix() {
        let id = SessionId::from("abc".to_string());
        assert_eq!(id.to_string(), "sess_abc");
    }
}
