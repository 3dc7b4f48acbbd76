use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of previous runs replayed into each prompt by default
pub const DEFAULT_HISTORY_RUNS: usize = 3;

/// Configuration for a conversational agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique agent identifier
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// System instructions prepended to every prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// How many completed runs of the session to replay as context
    #[serde(default = "default_history_runs")]
    pub history_runs: usize,
}

fn default_history_runs() -> usize {
    DEFAULT_HISTORY_RUNS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: None,
            description: None,
            instructions: None,
            history_runs: DEFAULT_HISTORY_RUNS,
        }
    }
}

impl AgentConfig {
    /// Create a configuration with an explicit id
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_history_runs(mut self, history_runs: usize) -> Self {
        self.history_runs = history_runs;
        self
    }
}
