use crate::error::{RuntimeError, RuntimeResult};
use chrono::{DateTime, Utc};
use conduit_core::SessionId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

/// `{session_id, created_at, last_activity, auth_principal,
/// concurrency_in_flight, concurrency_max}` from spec §3. `last_activity`
/// lives behind the same lock as the registry entry rather than its own
/// atomic, since `touch` and `sweep` both need a consistent read of it
/// together with `in_flight`.
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub auth_principal: String,
    last_activity: RwLock<DateTime<Utc>>,
    in_flight: AtomicU64,
    semaphore: Semaphore,
    pub concurrency_max: usize,
}

impl Session {
    fn new(auth_principal: String, concurrency_max: usize) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            created_at: now,
            auth_principal,
            last_activity: RwLock::new(now),
            in_flight: AtomicU64::new(0),
            semaphore: Semaphore::new(concurrency_max),
            concurrency_max,
        }
    }

    pub async fn last_activity(&self) -> DateTime<Utc> {
        *self.last_activity.read().await
    }

    pub async fn touch(&self) {
        *self.last_activity.write().await = Utc::now();
    }

    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_activity().await
    }
}

/// A held slot in a session's concurrency gate. Releases automatically on
/// drop, so a cancelled or panicking request can never leak the slot —
/// same "release on every suspension point" guarantee spec §5 requires.
pub struct SessionPermit<'a> {
    session: &'a Session,
    _permit: tokio::sync::SemaphorePermit<'a>,
}

impl Drop for SessionPermit<'_> {
    fn drop(&mut self) {
        self.session.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Session lifecycle, activity tracking, and expiry sweep (spec §4.8).
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    bearer_token: String,
    session_concurrency_max: usize,
    session_ttl: chrono::Duration,
    session_max_concurrent: usize,
}

impl SessionManager {
    pub fn new(bearer_token: String, session_concurrency_max: usize, session_ttl_secs: u64, session_max_concurrent: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            bearer_token,
            session_concurrency_max,
            session_ttl: chrono::Duration::seconds(session_ttl_secs as i64),
            session_max_concurrent,
        }
    }

    /// Rejects with `AuthFailed` on invalid bearer; enforces
    /// `session_max_concurrent` at the principal level.
    pub async fn open(&self, auth_token: &str) -> RuntimeResult<Arc<Session>> {
        if auth_token.is_empty() || auth_token != self.bearer_token {
            return Err(RuntimeError::AuthFailed);
        }
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.session_max_concurrent {
            return Err(RuntimeError::Busy);
        }
        let session = Arc::new(Session::new(auth_token.to_string(), self.session_concurrency_max));
        sessions.insert(session.id.as_str().to_string(), session.clone());
        Ok(session)
    }

    pub async fn get(&self, id: &SessionId) -> RuntimeResult<Arc<Session>> {
        let sessions = self.sessions.read().await;
        sessions.get(id.as_str()).cloned().ok_or(RuntimeError::AuthFailed)
    }

    /// Updates `last_activity`; called on every inbound frame.
    pub async fn touch(&self, id: &SessionId) -> RuntimeResult<()> {
        let session = self.get(id).await?;
        session.touch().await;
        Ok(())
    }

    /// Guards per-session in-flight count against `session_concurrency_max`.
    /// Returns `Busy` immediately rather than blocking — callers that want
    /// to queue do so themselves (spec §4.10's `max_queue_depth`).
    pub async fn acquire<'a>(&self, session: &'a Session) -> RuntimeResult<SessionPermit<'a>> {
        let permit = session.semaphore.try_acquire().map_err(|_| RuntimeError::Busy)?;
        session.in_flight.fetch_add(1, Ordering::AcqRel);
        Ok(SessionPermit { session, _permit: permit })
    }

    /// Waits for a slot rather than failing immediately. Callers use this
    /// only after admitting the wait into `max_queue_depth` (spec §4.10
    /// step 4) — the semaphore itself has no bound on how long this blocks.
    pub async fn acquire_waiting<'a>(&self, session: &'a Session) -> SessionPermit<'a> {
        let permit = session.semaphore.acquire().await.expect("session semaphore never closed");
        session.in_flight.fetch_add(1, Ordering::AcqRel);
        SessionPermit { session, _permit: permit }
    }

    /// Closes sessions idle longer than `session_ttl` with zero in-flight,
    /// returning the ids actually closed so callers can publish one
    /// `SessionClosed` event per session rather than a placeholder.
    pub async fn sweep(&self) -> Vec<SessionId> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();
        for (id, session) in sessions.iter() {
            if session.in_flight() == 0 && session.idle_for(now).await > self.session_ttl {
                to_remove.push(id.clone());
            }
        }
        for id in &to_remove {
            sessions.remove(id);
        }
        to_remove.into_iter().map(SessionId::from).collect()
    }

    pub async fn close(&self, id: &SessionId) {
        self.sessions.write().await.remove(id.as_str());
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub fn spawn_sweeper(manager: Arc<SessionManager>, events: conduit_events::EventBus, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let closed = manager.sweep().await;
            if !closed.is_empty() {
                tracing::info!(removed = closed.len(), "session sweep closed idle sessions");
                for session_id in closed {
                    events.publish(conduit_events::ConduitEvent::SessionClosed {
                        session_id,
                        reason: conduit_events::SessionCloseReason::IdleExpiry,
                    });
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::new("secret".to_string(), 2, 3600, 100)
    }

    #[tokio::test]
    async fn open_with_wrong_token_fails() {
        let mgr = manager();
        assert!(matches!(mgr.open("wrong").await, Err(RuntimeError::AuthFailed)));
    }

    #[tokio::test]
    async fn open_with_correct_token_succeeds() {
        let mgr = manager();
        let session = mgr.open("secret").await.unwrap();
        assert_eq!(session.in_flight(), 0);
    }

    #[tokio::test]
    async fn acquire_respects_concurrency_max() {
        let mgr = manager();
        let session = mgr.open("secret").await.unwrap();
        let _p1 = mgr.acquire(&session).await.unwrap();
        let _p2 = mgr.acquire(&session).await.unwrap();
        assert!(matches!(mgr.acquire(&session).await, Err(RuntimeError::Busy)));
    }

    #[tokio::test]
    async fn releasing_a_permit_frees_the_slot() {
        let mgr = manager();
        let session = mgr.open("secret").await.unwrap();
        {
            let _p = mgr.acquire(&session).await.unwrap();
            assert_eq!(session.in_flight(), 1);
        }
        assert_eq!(session.in_flight(), 0);
        assert!(mgr.acquire(&session).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_closes_idle_sessions_with_zero_in_flight() {
        let mgr = SessionManager::new("secret".to_string(), 2, 0, 100);
        let session = mgr.open("secret").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let closed = mgr.sweep().await;
        assert_eq!(closed, vec![session.id.clone()]);
        assert!(mgr.get(&session.id).await.is_err());
    }

    #[tokio::test]
    async fn sweep_never_closes_a_session_with_in_flight_work() {
        let mgr = SessionManager::new("secret".to_string(), 2, 0, 100);
        let session = mgr.open("secret").await.unwrap();
        let _permit = mgr.acquire(&session).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let closed = mgr.sweep().await;
        assert!(closed.is_empty());
    }
}
