//! Per-user session storage.
//!
//! One `Session` per user id, each behind its own mutex: two concurrent
//! turns for the same user serialize on that mutex, while turns for
//! different users never contend. A background sweep prunes sessions idle
//! longer than the configured timeout so the map cannot grow without
//! bound.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use super::state::{ApplicationDraft, PendingStep};

/// Dialogue progress for one user.
#[derive(Debug)]
pub struct Session {
    pub step: PendingStep,
    pub draft: ApplicationDraft,
    pub last_activity: Instant,
}

impl Session {
    fn new() -> Self {
        Self {
            step: PendingStep::Idle,
            draft: ApplicationDraft::default(),
            last_activity: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Drop any pending step and collected answers. The single
    /// cancellation path: unconditional, regardless of which step was
    /// pending.
    pub fn reset(&mut self) {
        self.step = PendingStep::Idle;
        self.draft = ApplicationDraft::default();
    }
}

/// Concurrency-safe session map keyed by user id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Get the per-user session handle, creating it lazily. The outer map
    /// lock is held only for the lookup/insert, never across a turn.
    pub async fn get_or_create(&self, user_id: &str) -> Arc<Mutex<Session>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(user_id) {
                return Arc::clone(session);
            }
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Session::new()))),
        )
    }

    /// Drop a user's session entirely (successful submission).
    pub async fn remove(&self, user_id: &str) {
        self.sessions.write().await.remove(user_id);
    }

    /// Remove sessions idle longer than the timeout. Returns how many were
    /// pruned. An in-flight turn keeps its session alive through its own
    /// `Arc` even if pruned from the map.
    pub async fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let timeout = self.idle_timeout;
        let mut keep = HashMap::new();
        for (id, session) in sessions.drain() {
            let alive = match session.try_lock() {
                Ok(guard) => guard.last_activity.elapsed() < timeout,
                // Locked means a turn is running right now.
                Err(_) => true,
            };
            if alive {
                keep.insert(id, session);
            }
        }
        *sessions = keep;
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Spawn the idle-session sweep task.
pub fn spawn_sweep_task(
    store: Arc<SessionStore>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let pruned = store.prune_idle().await;
            if pruned > 0 {
                tracing::debug!(pruned, "Pruned idle sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_created_lazily_and_shared() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.len().await, 0);

        let a = store.get_or_create("u1").await;
        let b = store.get_or_create("u1").await;
        assert_eq!(store.len().await, 1);
        assert!(Arc::ptr_eq(&a, &b));

        store.get_or_create("u2").await;
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn remove_drops_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.get_or_create("u1").await;
        store.remove("u1").await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn prune_removes_only_idle_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        store.get_or_create("idle").await;
        // A session whose mutex is held counts as active.
        let active = store.get_or_create("active").await;
        let _guard = active.lock().await;

        let pruned = store.prune_idle().await;
        assert_eq!(pruned, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn fresh_sessions_survive_prune() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.get_or_create("u1").await;
        assert_eq!(store.prune_idle().await, 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn reset_clears_step_and_draft() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.get_or_create("u1").await;
        {
            let mut s = session.lock().await;
            s.step = PendingStep::AwaitingPhone;
            s.draft.fio = Some("Иванов".into());
            s.reset();
            assert_eq!(s.step, PendingStep::Idle);
            assert_eq!(s.draft, ApplicationDraft::default());
        }
    }

    #[tokio::test]
    async fn distinct_users_do_not_block_each_other() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let a = store.get_or_create("a").await;
        let _hold_a = a.lock().await;

        // Locking b's session must complete even while a's is held.
        let b = store.get_or_create("b").await;
        tokio::time::timeout(Duration::from_millis(100), b.lock())
            .await
            .expect("user b blocked on user a's session");
    }
}
