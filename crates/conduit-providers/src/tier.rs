use serde::{Deserialize, Serialize};

/// The three model buckets routing chooses between, per spec §4.4.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Manager,
    Complex,
    LongContext,
}

impl Tier {
    /// Escalation is bounded to at most one tier jump per request (spec
    /// §4.4): manager -> complex -> long_context, never skipping, never
    /// wrapping past long_context.
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Manager => Some(Tier::Complex),
            Tier::Complex => Some(Tier::LongContext),
            Tier::LongContext => None,
        }
    }
}
