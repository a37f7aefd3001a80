//! In-memory editing sessions.
//!
//! One session is one CV being tailored: its editor state, the job analysis it is
//! scored against, and the upstream recommendations still waiting for a decision.
//! Every access takes the write lock, so actions on a session run one at a time.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::cv::recommendation::Recommendation;
use crate::patch::reducer::{Action, ActionOutcome, EditorState};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub editor: EditorState,
    pub job_analysis: Option<Value>,
    pub pending: Vec<Recommendation>,
    pub created_at: DateTime<Utc>,
    pub touched_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        editor: EditorState,
        job_analysis: Option<Value>,
        pending: Vec<Recommendation>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            editor,
            job_analysis,
            pending,
            created_at: now,
            touched_at: now,
        }
    }

    /// Dispatches an action. Recommendations the action carried leave the pending
    /// list whether they applied or were skipped.
    pub fn dispatch(&mut self, action: Action) -> Vec<ActionOutcome> {
        let handled: Vec<String> = match &action {
            Action::ApplyRecommendation { recommendation } => vec![recommendation.id.clone()],
            Action::ApplyBatch { recommendations } => {
                recommendations.iter().map(|r| r.id.clone()).collect()
            }
            _ => Vec::new(),
        };

        let outcomes = self.editor.dispatch(action);
        if !handled.is_empty() {
            self.pending.retain(|r| !handled.contains(&r.id));
        }
        outcomes
    }

    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.touched_at > ttl
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_sessions,
            Duration::minutes(config.session_ttl_minutes),
        )
    }

    /// Stores a session, dropping expired ones first and then the least recently
    /// touched while the store is full.
    pub async fn insert(&self, session: Session) -> Uuid {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let ttl = self.ttl;

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now, ttl));
        if sessions.len() < before {
            info!("Pruned {} expired sessions", before - sessions.len());
        }

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .values()
                .min_by_key(|s| s.touched_at)
                .map(|s| s.id)
            else {
                break;
            };
            sessions.remove(&oldest);
            info!("Evicted session {oldest} (store full)");
        }

        let id = session.id;
        sessions.insert(id, session);
        debug!("Session {id} created ({} live)", sessions.len());
        id
    }

    /// Runs `f` against a live session and marks it touched. `None` when the session
    /// is unknown or has expired (an expired session is dropped here).
    pub async fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        if sessions.get(&id)?.is_expired(now, self.ttl) {
            sessions.remove(&id);
            info!("Session {id} expired");
            return None;
        }

        let session = sessions.get_mut(&id)?;
        session.touched_at = now;
        Some(f(session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::hydrate::hydrate_document;
    use serde_json::json;

    fn session() -> Session {
        let document = hydrate_document(&json!([
            {"id": "header", "name": "Header", "type": "object",
             "fields": [{"id": "email", "name": "Email", "value": "ada@example.com"}]}
        ]));
        Session::new(
            EditorState::seeded(document, 1),
            None,
            vec![
                Recommendation::new("header", "email", "ada@lovelace.dev"),
                Recommendation::new("header", "phone", "555-0100"),
            ],
        )
    }

    #[tokio::test]
    async fn test_insert_and_access_touches_session() {
        let store = SessionStore::new(10, Duration::minutes(5));
        let mut stale = session();
        stale.touched_at = Utc::now() - Duration::minutes(1);
        let before = stale.touched_at;
        let id = store.insert(stale).await;

        let touched = store.with_session(id, |s| s.touched_at).await.unwrap();
        assert!(touched > before);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_full_store_evicts_least_recently_touched() {
        let store = SessionStore::new(2, Duration::minutes(60));
        let mut first = session();
        first.touched_at = Utc::now() - Duration::minutes(10);
        let mut second = session();
        second.touched_at = Utc::now() - Duration::minutes(5);

        let first_id = store.insert(first).await;
        let second_id = store.insert(second).await;
        let third_id = store.insert(session()).await;

        assert_eq!(store.len().await, 2);
        assert!(store.with_session(first_id, |_| ()).await.is_none());
        assert!(store.with_session(second_id, |_| ()).await.is_some());
        assert!(store.with_session(third_id, |_| ()).await.is_some());
    }

    #[tokio::test]
    async fn test_expired_session_is_dropped_on_access() {
        let store = SessionStore::new(10, Duration::minutes(30));
        let mut old = session();
        old.touched_at = Utc::now() - Duration::minutes(31);
        let id = old.id;
        store.sessions.write().await.insert(id, old);

        assert!(store.with_session(id, |_| ()).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_remove_unknown_session() {
        let store = SessionStore::new(10, Duration::minutes(30));
        assert!(!store.remove(Uuid::new_v4()).await);
    }

    #[test]
    fn test_dispatch_clears_handled_recommendations() {
        let mut session = session();
        let first = session.pending[0].clone();
        let outcomes = session.dispatch(Action::ApplyRecommendation {
            recommendation: first,
        });

        assert!(outcomes[0].is_applied());
        assert_eq!(session.pending.len(), 1);
        assert_eq!(session.pending[0].field, "phone");

        let unresolvable = session.pending[0].clone();
        let outcomes = session.dispatch(Action::ApplyBatch {
            recommendations: vec![unresolvable],
        });
        assert!(!outcomes[0].is_applied());
        assert!(session.pending.is_empty());
    }
}
