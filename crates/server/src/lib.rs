//! agent-os-server
//!
//! HTTP application for serving agents: REST routes, an AG-UI interface and
//! an MCP server. The `agent-os` binary wires it to environment settings and
//! binds the listener; this library never opens sockets by itself.

pub mod agui;
pub mod api;
pub mod app;
pub mod config;
pub mod handlers;
pub mod mcp;
pub mod routes;

pub use api::{AgentRegistry, ServerState};
pub use app::{AgentOs, AgentOsBuilder, AppError, Interface};
pub use config::{ConfigError, Settings};
pub use mcp::AgentOsMcp;
pub use routes::create_router;

pub use agent_os_core;
