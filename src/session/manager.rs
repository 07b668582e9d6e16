//! In-memory registry of live sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::session::store::SessionState;

/// A session handle. The mutex serializes requests within one session.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Holds every session keyed by its cookie id.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session, creating a fresh one when the id is missing or unknown.
    ///
    /// Unknown ids (expired or forged cookies) are never adopted; the new
    /// session gets a random id. Returns the id in use and whether it was created.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        if let Some(id) = id
            && let Some(handle) = self.sessions.read().await.get(&id)
        {
            return (id, handle.clone(), false);
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(SessionState::new(id)));
        self.sessions.write().await.insert(id, handle.clone());
        tracing::debug!(session = %id, "Created session");
        (id, handle, true)
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for longer than `max_idle`. Sessions with a request
    /// in flight are skipped. Returns `(checked, pruned)`.
    ///
    /// An idle limit reaching back past the representable time range prunes
    /// nothing.
    pub async fn prune_idle(&self, max_idle: Duration) -> (usize, usize) {
        let cutoff = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle));

        let mut sessions = self.sessions.write().await;
        let Some(cutoff) = cutoff else {
            return (sessions.len(), 0);
        };
        let checked = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(state) => state.last_active >= cutoff,
            Err(_) => true,
        });
        (checked, checked - sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_reuses_known_id() {
        let manager = SessionManager::new();
        let (id, _, created) = manager.get_or_create(None).await;
        assert!(created);

        let (again, _, created) = manager.get_or_create(Some(id)).await;
        assert_eq!(again, id);
        assert!(!created);
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let manager = SessionManager::new();
        let stale = Uuid::new_v4();
        let (id, handle, created) = manager.get_or_create(Some(stale)).await;
        assert!(created);
        assert_ne!(id, stale);
        assert_eq!(handle.lock().await.id, id);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::new();
        let (_, first, _) = manager.get_or_create(None).await;
        let (_, second, _) = manager.get_or_create(None).await;

        first.lock().await.view.selection.push(1);
        assert!(second.lock().await.view.selection.is_empty());
    }

    #[tokio::test]
    async fn test_prune_idle() {
        let manager = SessionManager::new();
        let (old, handle, _) = manager.get_or_create(None).await;
        let (fresh, _, _) = manager.get_or_create(None).await;
        handle.lock().await.last_active = Utc::now() - chrono::Duration::hours(2);

        let (checked, pruned) = manager.prune_idle(Duration::from_secs(3600)).await;
        assert_eq!((checked, pruned), (2, 1));
        assert!(manager.get(old).await.is_none());
        assert!(manager.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_prune_with_unbounded_idle_limit() {
        let manager = SessionManager::new();
        let (id, handle, _) = manager.get_or_create(None).await;
        handle.lock().await.last_active = Utc::now() - chrono::Duration::days(365);

        for max_idle in [Duration::from_secs(10_000_000_000_000), Duration::MAX] {
            let (checked, pruned) = manager.prune_idle(max_idle).await;
            assert_eq!((checked, pruned), (1, 0));
        }
        assert!(manager.get(id).await.is_some());
    }

    #[tokio::test]
    async fn test_prune_skips_busy_session() {
        let manager = SessionManager::new();
        let (id, handle, _) = manager.get_or_create(None).await;
        let mut guard = handle.lock().await;
        guard.last_active = Utc::now() - chrono::Duration::hours(2);

        let (_, pruned) = manager.prune_idle(Duration::from_secs(60)).await;
        drop(guard);
        assert_eq!(pruned, 0);
        assert!(manager.get(id).await.is_some());
    }
}
