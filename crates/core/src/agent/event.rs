//! Events emitted while an agent run is in progress

use serde::{Deserialize, Serialize};

/// Run lifecycle event
///
/// A run always starts with `RunStarted` (unless it is rejected before
/// starting) and ends with exactly one of `RunCompleted` or `RunError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        session_id: String,
        agent_id: String,
        model: String,
    },
    RunContent {
        run_id: String,
        session_id: String,
        content: String,
    },
    RunCompleted {
        run_id: String,
        session_id: String,
        content: String,
    },
    RunError {
        run_id: String,
        session_id: String,
        error: String,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> &str {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::RunContent { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunError { run_id, .. } => run_id,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::RunStarted { session_id, .. }
            | Self::RunContent { session_id, .. }
            | Self::RunCompleted { session_id, .. }
            | Self::RunError { session_id, .. } => session_id,
        }
    }
}
