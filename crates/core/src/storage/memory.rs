//! In-memory storage backend
//!
//! Sessions live for the lifetime of the process.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{RunRecord, Session, SessionFilter, Storage, StorageError, StorageResult};

/// Process-local session storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn get_session(&self, session_id: &str) -> StorageResult<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn upsert_session(&self, session: Session) -> StorageResult<()> {
        debug!(session_id = %session.session_id, runs = session.runs.len(), "storing session");
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn append_run(&self, session: Session, run: RunRecord) -> StorageResult<()> {
        let mut sessions = self.sessions.write().await;
        let agent_id = session.agent_id.clone();
        let stored = sessions
            .entry(session.session_id.clone())
            .or_insert(session);
        if stored.agent_id != agent_id {
            return Err(StorageError::OwnerConflict {
                session_id: stored.session_id.clone(),
                owner: stored.agent_id.clone(),
            });
        }

        debug!(session_id = %stored.session_id, run_id = %run.run_id, "recording run");
        stored.upsert_run(run);
        Ok(())
    }

    async fn delete_session(&self, session_id: &str) -> StorageResult<()> {
        match self.sessions.write().await.remove(session_id) {
            Some(_) => Ok(()),
            None => Err(StorageError::SessionNotFound(session_id.to_string())),
        }
    }

    async fn list_sessions(&self, filter: &SessionFilter) -> StorageResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut matching: Vec<Session> = sessions
            .values()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_upsert_and_get() {
        let storage = InMemoryStorage::new();
        assert!(storage.is_empty().await);

        storage
            .upsert_session(Session::new("s1", "agent", None))
            .await
            .unwrap();

        let session = storage.get_session("s1").await.unwrap().unwrap();
        assert_eq!(session.agent_id, "agent");
        assert!(storage.get_session("missing").await.unwrap().is_none());
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let storage = InMemoryStorage::new();
        storage
            .upsert_session(Session::new("s1", "agent", None))
            .await
            .unwrap();

        storage.delete_session("s1").await.unwrap();
        assert!(storage.is_empty().await);

        let err = storage.delete_session("s1").await.unwrap_err();
        assert!(matches!(err, StorageError::SessionNotFound(id) if id == "s1"));
    }

    #[tokio::test]
    async fn test_list_sessions_filters_and_orders() {
        let storage = InMemoryStorage::new();

        let mut older = Session::new("old", "agent", None);
        older.updated_at = older.updated_at - Duration::minutes(5);
        storage.upsert_session(older).await.unwrap();
        storage
            .upsert_session(Session::new("new", "agent", None))
            .await
            .unwrap();
        storage
            .upsert_session(Session::new("other", "other-agent", None))
            .await
            .unwrap();

        let sessions = storage
            .list_sessions(&SessionFilter::for_agent("agent"))
            .await
            .unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);

        let all = storage.list_sessions(&SessionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_append_run_creates_then_extends_session() {
        let storage = InMemoryStorage::new();

        storage
            .append_run(Session::new("s1", "agent", None), RunRecord::start("r1", "hi"))
            .await
            .unwrap();
        // A stale copy with no runs must not drop the stored run.
        storage
            .append_run(Session::new("s1", "agent", None), RunRecord::start("r2", "again"))
            .await
            .unwrap();

        let session = storage.get_session("s1").await.unwrap().unwrap();
        let ids: Vec<&str> = session.runs.iter().map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn test_append_run_rejects_other_owner() {
        let storage = InMemoryStorage::new();
        storage
            .upsert_session(Session::new("s1", "owner", None))
            .await
            .unwrap();

        let err = storage
            .append_run(Session::new("s1", "intruder", None), RunRecord::start("r1", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::OwnerConflict { owner, .. } if owner == "owner"));
        assert!(storage.get_session("s1").await.unwrap().unwrap().runs.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let storage = InMemoryStorage::new();
        let clone = storage.clone();
        clone
            .upsert_session(Session::new("s1", "agent", None))
            .await
            .unwrap();
        assert_eq!(storage.len().await, 1);
    }
}
