//! Thread-safe registry of background refinement sessions.
//!
//! Sessions are inserted on start and evicted once they have been finished
//! for longer than the configured TTL. Live sessions are never evicted and
//! only they count against capacity; when the cap is reached new starts are
//! refused.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::record::{SessionRecord, SessionSummary};
use crate::error::{Result, TriadError};
use crate::id::generate_session_id;
use crate::refine::LoopEvent;

struct SessionEntry {
    record: SessionRecord,
    cancel: CancellationToken,
    finished_at: Option<Instant>,
}

impl SessionEntry {
    fn mark_finished_if_terminal(&mut self) {
        if self.record.status.is_terminal() && self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
        }
    }
}

/// Shared registry state - clone freely (it's an Arc inside)
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions,
            ttl,
        }
    }

    /// Register a new running session, returning its id and cancel token.
    pub async fn insert(&self, task: &str, max_rounds: u32) -> Result<(String, CancellationToken)> {
        self.evict_expired().await;

        let mut sessions = self.sessions.write().await;
        let live = sessions.values().filter(|e| e.finished_at.is_none()).count();
        if live >= self.max_sessions {
            return Err(TriadError::CapacityExceeded(self.max_sessions));
        }

        let mut id = generate_session_id();
        while sessions.contains_key(&id) {
            id = generate_session_id();
        }

        let cancel = CancellationToken::new();
        sessions.insert(
            id.clone(),
            SessionEntry {
                record: SessionRecord::new(&id, task, max_rounds),
                cancel: cancel.clone(),
                finished_at: None,
            },
        );
        info!("Registered session {} ({} live)", id, live + 1);

        Ok((id, cancel))
    }

    /// Apply a progress event to a session.
    pub async fn apply(&self, id: &str, event: &LoopEvent) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(id) {
            entry.record.apply(event);
            entry.mark_finished_if_terminal();
        }
    }

    /// Mark a session failed without an outcome.
    pub async fn fail(&self, id: &str, error: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(id) {
            entry.record.fail(error);
            entry.mark_finished_if_terminal();
        }
    }

    /// Snapshot of a session.
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|e| e.record.clone())
    }

    /// All sessions, oldest first.
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut result: Vec<SessionSummary> = sessions.values().map(|e| e.record.summary()).collect();
        result.sort_by_key(|s| s.start_time);
        result
    }

    /// Signal cancellation. Returns Ok(false) if the session already ended.
    pub async fn cancel(&self, id: &str) -> Result<bool> {
        let sessions = self.sessions.read().await;
        let entry = sessions
            .get(id)
            .ok_or_else(|| TriadError::SessionNotFound(id.to_string()))?;

        if entry.record.status.is_terminal() {
            return Ok(false);
        }
        entry.cancel.cancel();
        info!("Cancellation requested for session {}", id);
        Ok(true)
    }

    /// Drop sessions finished longer than the TTL ago. Returns how many.
    pub async fn evict_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, entry| match entry.finished_at {
            Some(finished) => finished.elapsed() < ttl,
            None => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {} expired sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::Outcome;
    use crate::session::SessionStatus;

    fn approved() -> LoopEvent {
        LoopEvent::Finished(Outcome::Approved {
            artifact: "done".into(),
            rounds_used: 1,
        })
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::new(10, Duration::from_secs(60));
        let (id, _cancel) = registry.insert("Write a haiku", 3).await.unwrap();

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.session_id, id);
        assert_eq!(record.task, "Write a haiku");
        assert_eq!(record.max_rounds, 3);
        assert_eq!(record.status, SessionStatus::Running);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown() {
        let registry = SessionRegistry::new(10, Duration::from_secs(60));
        assert!(registry.get("missing").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_capacity_limit() {
        let registry = SessionRegistry::new(2, Duration::from_secs(60));
        registry.insert("a", 1).await.unwrap();
        registry.insert("b", 1).await.unwrap();
        let err = registry.insert("c", 1).await.unwrap_err();
        assert!(matches!(err, TriadError::CapacityExceeded(2)));
    }

    #[tokio::test]
    async fn test_finished_sessions_evicted_after_ttl() {
        let registry = SessionRegistry::new(2, Duration::ZERO);
        let (done, _) = registry.insert("a", 1).await.unwrap();
        let (running, _) = registry.insert("b", 1).await.unwrap();
        registry.apply(&done, &approved()).await;

        assert_eq!(registry.evict_expired().await, 1);
        assert!(registry.get(&done).await.is_none());
        assert!(registry.get(&running).await.is_some());
    }

    #[tokio::test]
    async fn test_insert_makes_room_by_evicting_expired() {
        let registry = SessionRegistry::new(1, Duration::ZERO);
        let (first, _) = registry.insert("a", 1).await.unwrap();
        registry.apply(&first, &approved()).await;

        let (second, _) = registry.insert("b", 1).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_finished_sessions_kept_within_ttl() {
        let registry = SessionRegistry::new(2, Duration::from_secs(3600));
        let (id, _) = registry.insert("a", 1).await.unwrap();
        registry.apply(&id, &approved()).await;
        assert_eq!(registry.evict_expired().await, 0);
        assert!(registry.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_finished_sessions_within_ttl_do_not_block_capacity() {
        let registry = SessionRegistry::new(1, Duration::from_secs(3600));
        let (first, _) = registry.insert("a", 1).await.unwrap();
        registry.apply(&first, &approved()).await;

        let (second, _) = registry.insert("b", 1).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(registry.len().await, 2);
        assert!(registry.get(&first).await.is_some());

        // The running session still fills the single live slot
        let err = registry.insert("c", 1).await.unwrap_err();
        assert!(matches!(err, TriadError::CapacityExceeded(1)));
    }

    #[tokio::test]
    async fn test_cancel_signals_token() {
        let registry = SessionRegistry::new(2, Duration::from_secs(60));
        let (id, token) = registry.insert("a", 1).await.unwrap();
        assert!(registry.cancel(&id).await.unwrap());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_finished_session_is_noop() {
        let registry = SessionRegistry::new(2, Duration::from_secs(60));
        let (id, token) = registry.insert("a", 1).await.unwrap();
        registry.apply(&id, &approved()).await;
        assert!(!registry.cancel(&id).await.unwrap());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_unknown_session() {
        let registry = SessionRegistry::new(2, Duration::from_secs(60));
        let err = registry.cancel("missing").await.unwrap_err();
        assert!(matches!(err, TriadError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_apply_and_list() {
        let registry = SessionRegistry::new(5, Duration::from_secs(60));
        let (id, _) = registry.insert("first", 2).await.unwrap();
        registry.insert("second", 2).await.unwrap();
        registry
            .apply(&id, &LoopEvent::RoundStarted { round: 1, max_rounds: 2 })
            .await;

        let list = registry.list().await;
        assert_eq!(list.len(), 2);
        let first = list.iter().find(|s| s.session_id == id).unwrap();
        assert_eq!(first.current_round, 1);
    }

    #[tokio::test]
    async fn test_fail_marks_terminal() {
        let registry = SessionRegistry::new(2, Duration::ZERO);
        let (id, _) = registry.insert("a", 1).await.unwrap();
        registry.fail(&id, "boom").await;
        assert_eq!(registry.get(&id).await.unwrap().status, SessionStatus::Failed);
        assert_eq!(registry.evict_expired().await, 1);
    }
}
