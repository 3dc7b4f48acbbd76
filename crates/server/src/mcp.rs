//! MCP server
//!
//! Serves the application to Model Context Protocol clients over the
//! streamable HTTP transport on `/mcp`. Every session gets its own
//! `AgentOsMcp` handler sharing the server state.

use agent_os_core::{RunInput, SessionFilter};
use axum::Router;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    },
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ServerState;
use crate::api::{ListSessionsResponse, RunResponse, SessionSummary};

/// Route the MCP endpoint is mounted on
pub const MCP_ROUTE: &str = "/mcp";

/// Arguments of the `run_agent` tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunAgentArgs {
    /// Agent to run
    pub agent_id: String,
    /// User message
    pub message: String,
    /// Session to continue
    #[serde(default)]
    pub session_id: Option<String>,
    /// User owning a new session
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Arguments of the `get_sessions` tool
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetSessionsArgs {
    /// Only sessions of this agent
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Only sessions of this user
    #[serde(default)]
    pub user_id: Option<String>,
}

/// MCP tool handler backed by the application state
#[derive(Clone)]
pub struct AgentOsMcp {
    state: ServerState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AgentOsMcp {
    pub fn new(state: ServerState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get the configuration of this server: agents, interfaces and capabilities.")]
    async fn get_agentos_config(&self) -> Result<CallToolResult, McpError> {
        json_result(&*self.state.os_config)
    }

    #[tool(description = "Send a message to an agent and return its answer.")]
    async fn run_agent(
        &self,
        Parameters(args): Parameters<RunAgentArgs>,
    ) -> Result<CallToolResult, McpError> {
        let Some(agent) = self.state.agent_registry.get(&args.agent_id) else {
            return Ok(tool_error(format!("Agent '{}' not found", args.agent_id)));
        };

        debug!(agent_id = %args.agent_id, "MCP run requested");
        let input = RunInput {
            message: args.message,
            session_id: args.session_id,
            user_id: args.user_id,
            run_id: None,
        };

        match agent.run(input).await {
            Ok(output) => {
                let response = RunResponse::new(agent.id(), output);
                let mut result =
                    CallToolResult::success(vec![Content::text(response.content.clone())]);
                result.structured_content = serde_json::to_value(&response).ok();
                Ok(result)
            }
            Err(e) => {
                warn!(agent_id = %args.agent_id, error = %e, "MCP run failed");
                Ok(tool_error(e.to_string()))
            }
        }
    }

    #[tool(description = "List stored sessions, optionally filtered by agent or user.")]
    async fn get_sessions(
        &self,
        Parameters(args): Parameters<GetSessionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        let filter = SessionFilter {
            agent_id: args.agent_id,
            user_id: args.user_id,
        };

        match self.state.agent_registry.list_sessions(&filter).await {
            Ok(sessions) => {
                let sessions: Vec<SessionSummary> =
                    sessions.iter().map(SessionSummary::from).collect();
                json_result(&ListSessionsResponse {
                    total: sessions.len(),
                    sessions,
                })
            }
            Err(e) => Ok(tool_error(e.to_string())),
        }
    }
}

#[tool_handler]
impl ServerHandler for AgentOsMcp {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = self.state.os_config.os_id.clone();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = self.state.os_config.description.clone();
        info
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let structured =
        serde_json::to_value(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    let mut result = CallToolResult::success(vec![Content::text(structured.to_string())]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn tool_error(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

/// Build the MCP route
pub fn router(state: ServerState) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(AgentOsMcp::new(state.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    Router::new().nest_service(MCP_ROUTE, service)
}
