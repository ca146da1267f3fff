//! Size-gated payload routing between inline WebSocket delivery and
//! out-of-band persisted transactions, fronted by a circuit breaker so a
//! struggling backend fails fast instead of hanging every oversized
//! request.

pub mod backend;
pub mod breaker;
pub mod client;
pub mod error;
pub mod transaction;

pub use backend::{BusBackend, MemoryBusBackend};
pub use breaker::{CircuitBreaker, CircuitState};
pub use client::{MessageBusClient, RouteDecision};
pub use error::{BusError, BusResult};
pub use transaction::{sha256_hex, Transaction};
