//! agent-os launcher
//!
//! Startup sequence:
//!   1. Init logger (`RUST_LOG`, default `info`)
//!   2. Resolve settings from the environment; abort if the model base URL is missing
//!   3. Build storage, model client, agent and application
//!   4. Bind `0.0.0.0:$PORT` and serve until Ctrl-C

use std::sync::Arc;

use agent_os_core::{Agent, AgentConfig, InMemoryStorage, OpenAIChat};
use agent_os_server::{AgentOs, Interface, Settings};
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    info!(base_url = %settings.base_url, model = %settings.model_id, "settings loaded");

    let storage = Arc::new(InMemoryStorage::new());
    let model = Arc::new(OpenAIChat::new(settings.model_config()));
    let agent = Agent::new(
        AgentConfig::new("conversational-agent").with_name("Conversational Agent"),
        model,
        storage,
    );

    let agent_os = AgentOs::builder()
        .description("Example app with MCP enabled")
        .agent(agent.clone())
        .enable_mcp_server(true)
        .interface(Interface::agui(agent))
        .build()?;
    let app = agent_os.get_app();

    let addr = settings.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, os_id = %agent_os.id(), "agent-os listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("agent-os shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
