use crate::error::{ContinuityError, ContinuityResult};
use crate::turn::Turn;
use conduit_core::time::{Clock, SystemClock};
use conduit_core::ContinuationId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct ContinuationEntry {
    turns: Vec<Turn>,
    last_access: Instant,
}

/// Maps `continuation_id -> ordered turn list`, per spec §4.2. The write
/// lock is only ever held for the duration of a single map mutation —
/// never across an `.await` that could block on anything else, the same
/// discipline the teacher applies to its session registries
/// (`astrid-kernel`'s `RwLock<HashMap<SessionId, SessionHandle>>`).
pub struct ConversationStore {
    continuations: RwLock<HashMap<String, ContinuationEntry>>,
    idle_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ConversationStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self::with_clock(idle_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(idle_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            continuations: RwLock::new(HashMap::new()),
            idle_ttl,
            clock,
        }
    }

    pub async fn begin(&self) -> ContinuationId {
        let id = ContinuationId::new();
        let mut map = self.continuations.write().await;
        map.insert(
            id.as_str().to_string(),
            ContinuationEntry {
                turns: Vec::new(),
                last_access: self.clock.now(),
            },
        );
        id
    }

    pub async fn append(&self, id: &ContinuationId, turn: Turn) -> ContinuityResult<()> {
        let mut map = self.continuations.write().await;
        let entry = map.get_mut(id.as_str()).ok_or(ContinuityError::UnknownContinuation)?;
        if entry.is_expired(self.idle_ttl, self.clock.now()) {
            map.remove(id.as_str());
            return Err(ContinuityError::UnknownContinuation);
        }
        entry.turns.push(turn);
        entry.last_access = self.clock.now();
        Ok(())
    }

    /// Snapshot of the continuation's turns; touches `last_access`.
    pub async fn load(&self, id: &ContinuationId) -> ContinuityResult<Vec<Turn>> {
        let mut map = self.continuations.write().await;
        let entry = map.get_mut(id.as_str()).ok_or(ContinuityError::UnknownContinuation)?;
        if entry.is_expired(self.idle_ttl, self.clock.now()) {
            map.remove(id.as_str());
            return Err(ContinuityError::UnknownContinuation);
        }
        entry.last_access = self.clock.now();
        Ok(entry.turns.clone())
    }

    /// Removes continuations whose `last_access + ttl < now`.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.continuations.write().await;
        let before = map.len();
        map.retain(|_, entry| !entry.is_expired(self.idle_ttl, now));
        before - map.len()
    }
}

impl ContinuationEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) > ttl
    }
}

/// Prepend prior turns to a new request subject to a context budget,
/// dropping the oldest turns first and never splitting a turn — spec §4.6
/// step 2. `budget_tokens` is an estimated-token ceiling, not a byte count.
pub fn prepend_within_budget(mut prior_turns: Vec<Turn>, budget_tokens: usize) -> Vec<Turn> {
    let mut total: usize = prior_turns.iter().map(Turn::estimated_tokens).sum();
    while total > budget_tokens && !prior_turns.is_empty() {
        let dropped = prior_turns.remove(0);
        total = total.saturating_sub(dropped.estimated_tokens());
    }
    prior_turns
}

pub fn spawn_sweeper(store: Arc<ConversationStore>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = store.sweep().await;
            if removed > 0 {
                tracing::debug!(removed, "continuation sweep removed expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn begin_append_load_roundtrips() {
        let store = ConversationStore::new(Duration::from_secs(60));
        let id = store.begin().await;
        store.append(&id, Turn::user("hi")).await.unwrap();
        store.append(&id, Turn::assistant("hello")).await.unwrap();
        let turns = store.load(&id).await.unwrap();
        assert_eq!(turns.len(), 2);
    }

    #[tokio::test]
    async fn append_to_unknown_continuation_fails() {
        let store = ConversationStore::new(Duration::from_secs(60));
        let err = store.append(&ContinuationId::new(), Turn::user("x")).await.unwrap_err();
        assert!(matches!(err, ContinuityError::UnknownContinuation));
    }

    #[tokio::test]
    async fn sweep_removes_idle_continuations() {
        let store = ConversationStore::new(Duration::from_millis(5));
        let id = store.begin().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = store.sweep().await;
        assert_eq!(removed, 1);
        assert!(store.load(&id).await.is_err());
    }

    #[tokio::test]
    async fn sweep_respects_injected_clock_without_sleeping() {
        let clock = Arc::new(conduit_core::time::FakeClock::new());
        let store = ConversationStore::with_clock(Duration::from_secs(60), clock.clone());
        let id = store.begin().await;
        clock.advance(Duration::from_secs(120));
        let removed = store.sweep().await;
        assert_eq!(removed, 1);
        assert!(store.load(&id).await.is_err());
    }

    #[test]
    fn budget_drops_oldest_turns_first() {
        let turns = vec![
            Turn::user("a".repeat(400)), // ~100 tokens
            Turn::user("b".repeat(40)),  // ~10 tokens
        ];
        let kept = prepend_within_budget(turns, 20);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].content.starts_with('b'));
    }

    #[test]
    fn budget_never_splits_a_turn() {
        let turns = vec![Turn::user("x".repeat(4000))];
        let kept = prepend_within_budget(turns, 1);
        // can't shrink below zero turns without removing the whole thing,
        // and a single turn is never partially kept.
        assert!(kept.is_empty() || kept[0].content.len() == 4000);
    }
}
