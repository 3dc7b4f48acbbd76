//! Session storage module
//!
//! Agents persist conversation sessions through the `Storage` trait. Each
//! session holds the ordered list of runs (one user input and its answer).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ChatMessage;

pub mod memory;

pub use memory::InMemoryStorage;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The session is owned by another agent
    #[error("Session {session_id} is owned by agent {owner}")]
    OwnerConflict { session_id: String, owner: String },

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Status of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// A single input/answer exchange inside a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Create a running record
    pub fn start(run_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            input: input.into(),
            output: None,
            status: RunStatus::Running,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn complete(&mut self, output: String) {
        self.output = Some(output);
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: String) {
        self.error = Some(error);
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// Conversation session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub runs: Vec<RunRecord>,
}

impl Session {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            user_id,
            created_at: now,
            updated_at: now,
            runs: Vec::new(),
        }
    }

    /// Replay the last `max_runs` completed runs as chat messages
    pub fn history(&self, max_runs: usize) -> Vec<ChatMessage> {
        let completed: Vec<&RunRecord> = self
            .runs
            .iter()
            .filter(|run| run.status == RunStatus::Completed)
            .collect();
        let skip = completed.len().saturating_sub(max_runs);

        completed
            .into_iter()
            .skip(skip)
            .flat_map(|run| {
                [
                    ChatMessage::user(run.input.clone()),
                    ChatMessage::assistant(run.output.clone().unwrap_or_default()),
                ]
            })
            .collect()
    }

    /// Insert or replace a run record by id
    pub fn upsert_run(&mut self, run: RunRecord) {
        match self.runs.iter_mut().find(|r| r.run_id == run.run_id) {
            Some(existing) => *existing = run,
            None => self.runs.push(run),
        }
        self.updated_at = Utc::now();
    }
}

/// Filter for listing sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl SessionFilter {
    pub fn for_agent(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: Some(agent_id.into()),
            user_id: None,
        }
    }

    pub fn matches(&self, session: &Session) -> bool {
        self.agent_id.as_deref().is_none_or(|id| id == session.agent_id)
            && self
                .user_id
                .as_deref()
                .is_none_or(|id| session.user_id.as_deref() == Some(id))
    }
}

/// Core trait for session storage backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend name, used for display only
    fn name(&self) -> &str;

    /// Fetch a session by id
    async fn get_session(&self, session_id: &str) -> StorageResult<Option<Session>>;

    /// Insert or replace a session
    async fn upsert_session(&self, session: Session) -> StorageResult<()>;

    /// Record a run in the stored session, inserting `session` first when no
    /// session with its id exists
    ///
    /// The lookup and the write happen atomically, so concurrent runs on one
    /// session never overwrite each other's records.
    async fn append_run(&self, session: Session, run: RunRecord) -> StorageResult<()>;

    /// Delete a session, failing with `SessionNotFound` if it does not exist
    async fn delete_session(&self, session_id: &str) -> StorageResult<()>;

    /// List sessions matching the filter, most recently updated first
    async fn list_sessions(&self, filter: &SessionFilter) -> StorageResult<Vec<Session>>;
}
