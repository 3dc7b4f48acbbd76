use thiserror::Error;

/// Errors that can occur during agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    /// The run input was empty
    #[error("Run input is empty")]
    EmptyInput,

    /// The session exists but belongs to a different agent
    #[error("Session {session_id} belongs to agent {owner}")]
    SessionMismatch { session_id: String, owner: String },

    /// Model error
    #[error("Model error: {0}")]
    Model(#[from] crate::model::ModelError),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// The run ended with an error event
    #[error("Run failed: {0}")]
    RunFailed(String),
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;
