//! Application assembly
//!
//! `AgentOs` gathers agents, interfaces and the optional MCP server into one
//! axum `Router`. Building the router never binds a socket; serving it is up
//! to the caller.

use std::collections::HashSet;

use agent_os_core::Agent;
use axum::Router;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::api::{AgentRegistry, InterfaceInfo, OsConfigResponse, ServerState};
use crate::{agui, mcp, routes};

/// Errors raised while assembling the application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("agent id registered twice: {0}")]
    DuplicateAgent(String),

    #[error("interface {interface} references unregistered agent {agent_id}")]
    UnknownInterfaceAgent { interface: String, agent_id: String },

    #[error("interface {0} configured more than once")]
    DuplicateInterface(String),
}

/// Protocol interface exposing one agent
#[derive(Debug, Clone)]
pub enum Interface {
    /// AG-UI event stream on `/agui`
    AgUi { agent: Agent },
}

impl Interface {
    pub fn agui(agent: Agent) -> Self {
        Self::AgUi { agent }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgUi { .. } => "agui",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            Self::AgUi { .. } => agui::AGUI_ROUTE,
        }
    }

    pub fn agent(&self) -> &Agent {
        match self {
            Self::AgUi { agent } => agent,
        }
    }

    fn router(&self) -> Router {
        match self {
            Self::AgUi { agent } => agui::router(agent.clone()),
        }
    }

    fn info(&self) -> InterfaceInfo {
        InterfaceInfo {
            kind: self.kind().to_string(),
            route: self.route().to_string(),
            agent_id: self.agent().id().to_string(),
        }
    }
}

/// Builder for [`AgentOs`]
#[derive(Debug, Default)]
pub struct AgentOsBuilder {
    id: Option<String>,
    description: Option<String>,
    agents: Vec<Agent>,
    enable_mcp_server: bool,
    interfaces: Vec<Interface>,
}

impl AgentOsBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn enable_mcp_server(mut self, enabled: bool) -> Self {
        self.enable_mcp_server = enabled;
        self
    }

    pub fn interface(mut self, interface: Interface) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Validate the configuration and build the application
    pub fn build(self) -> Result<AgentOs, AppError> {
        let mut agent_ids = HashSet::new();
        for agent in &self.agents {
            if !agent_ids.insert(agent.id()) {
                return Err(AppError::DuplicateAgent(agent.id().to_string()));
            }
        }

        let mut kinds = HashSet::new();
        for interface in &self.interfaces {
            if !kinds.insert(interface.kind()) {
                return Err(AppError::DuplicateInterface(interface.kind().to_string()));
            }
            if !agent_ids.contains(interface.agent().id()) {
                return Err(AppError::UnknownInterfaceAgent {
                    interface: interface.kind().to_string(),
                    agent_id: interface.agent().id().to_string(),
                });
            }
        }

        Ok(AgentOs {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            description: self.description,
            registry: AgentRegistry::new(self.agents),
            enable_mcp_server: self.enable_mcp_server,
            interfaces: self.interfaces,
        })
    }
}

/// Server application exposing agents over REST, AG-UI and MCP
pub struct AgentOs {
    id: String,
    description: Option<String>,
    registry: AgentRegistry,
    enable_mcp_server: bool,
    interfaces: Vec<Interface>,
}

impl AgentOs {
    pub fn builder() -> AgentOsBuilder {
        AgentOsBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Description served by `GET /config` and the MCP handshake
    pub fn config(&self) -> OsConfigResponse {
        OsConfigResponse {
            os_id: self.id.clone(),
            description: self.description.clone(),
            agents: self.registry.get_all_info(),
            interfaces: self.interfaces.iter().map(Interface::info).collect(),
            mcp_server: self.enable_mcp_server,
        }
    }

    /// Build the HTTP application
    pub fn get_app(&self) -> Router {
        let state = ServerState::new(self.registry.clone(), self.config());

        let mut app = routes::create_router(state.clone());
        for interface in &self.interfaces {
            info!(interface = interface.kind(), route = interface.route(), agent_id = %interface.agent().id(), "mounting interface");
            app = app.merge(interface.router());
        }
        if self.enable_mcp_server {
            info!(route = mcp::MCP_ROUTE, "mounting MCP server");
            app = app.merge(mcp::router(state));
        }

        app.layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }
}
