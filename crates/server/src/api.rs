//! API models and server state

use std::sync::Arc;

use agent_os_core::{Agent, RunOutput, Session, SessionFilter, StorageResult};
use serde::{Deserialize, Serialize};

/// Request to run an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// User message
    pub message: String,

    /// Optional session ID to continue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Optional user ID recorded on new sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Stream run events over SSE instead of returning one JSON body
    #[serde(default)]
    pub stream: bool,
}

/// Response from a non-streaming run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResponse {
    pub run_id: String,
    pub session_id: String,
    pub agent_id: String,
    pub content: String,
}

impl RunResponse {
    pub fn new(agent_id: &str, output: RunOutput) -> Self {
        Self {
            run_id: output.run_id,
            session_id: output.session_id,
            agent_id: agent_id.to_string(),
            content: output.content,
        }
    }
}

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub provider: String,
}

/// Agent information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    pub agent_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub model: ModelInfo,

    /// Storage backend name
    pub storage: String,
}

impl From<&Agent> for AgentInfo {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id().to_string(),
            name: agent.name().map(str::to_string),
            description: agent.description().map(str::to_string),
            model: ModelInfo {
                id: agent.model().id().to_string(),
                provider: agent.model().provider().to_string(),
            },
            storage: agent.storage().name().to_string(),
        }
    }
}

/// Response for listing agents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAgentsResponse {
    pub agents: Vec<AgentInfo>,
    pub total: usize,
}

/// Session summary used in listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub agent_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub run_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            agent_id: session.agent_id.clone(),
            user_id: session.user_id.clone(),
            run_count: session.runs.len(),
            created_at: session.created_at.to_rfc3339(),
            updated_at: session.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSessionsResponse {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

/// Interface exposed by the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub route: String,
    pub agent_id: String,
}

/// Response for `GET /config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsConfigResponse {
    pub os_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub agents: Vec<AgentInfo>,
    pub interfaces: Vec<InterfaceInfo>,
    pub mcp_server: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Registry of the agents served by the application
///
/// Agents are registered once when the application is built; lookups keep
/// registration order.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<Vec<Agent>>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            agents: Arc::new(agents),
        }
    }

    /// Get an agent by id
    pub fn get(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id() == agent_id)
    }

    /// All agents in registration order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Get info for all agents
    pub fn get_all_info(&self) -> Vec<AgentInfo> {
        self.agents.iter().map(AgentInfo::from).collect()
    }

    /// List sessions across every agent's storage, most recently updated first
    pub async fn list_sessions(&self, filter: &SessionFilter) -> StorageResult<Vec<Session>> {
        let mut sessions = Vec::new();
        for agent in self.agents.iter() {
            if filter.agent_id.as_deref().is_some_and(|id| id != agent.id()) {
                continue;
            }
            let scoped = SessionFilter {
                agent_id: Some(agent.id().to_string()),
                user_id: filter.user_id.clone(),
            };
            sessions.extend(agent.storage().list_sessions(&scoped).await?);
        }
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    /// Find a session and the agent that owns it
    pub async fn find_session(&self, session_id: &str) -> StorageResult<Option<(Agent, Session)>> {
        for agent in self.agents.iter() {
            if let Some(session) = agent.storage().get_session(session_id).await? {
                if session.agent_id == agent.id() {
                    return Ok(Some((agent.clone(), session)));
                }
            }
        }
        Ok(None)
    }
}

/// Server state
///
/// Shared state across all HTTP handlers.
#[derive(Clone)]
pub struct ServerState {
    /// Agent registry
    pub agent_registry: AgentRegistry,

    /// Application description served by `GET /config`
    pub os_config: Arc<OsConfigResponse>,
}

impl ServerState {
    pub fn new(agent_registry: AgentRegistry, os_config: OsConfigResponse) -> Self {
        Self {
            agent_registry,
            os_config: Arc::new(os_config),
        }
    }
}
