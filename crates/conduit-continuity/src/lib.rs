//! Conversation continuity: continuation ids restoring prior turn context
//! across reconnects. Turn content may reference files by opaque provider
//! id; raw file bytes never live in this store.

pub mod error;
pub mod store;
pub mod turn;

pub use error::{ContinuityError, ContinuityResult};
pub use store::{prepend_within_budget, spawn_sweeper, ConversationStore};
pub use turn::{Turn, TurnRole};
