//! HTTP request handlers

use std::convert::Infallible;

use agent_os_core::{AgentError, RunInput, SessionFilter, StorageError};
use chrono::Utc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Json, Response, Sse,
        sse::{Event, KeepAlive},
    },
};
use futures_util::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::ServerState;
use crate::api::{
    ErrorResponse, ListAgentsResponse, ListSessionsResponse, RunRequest, RunResponse,
    SessionSummary,
};

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Describe the application: agents, interfaces and MCP availability
pub async fn get_config(State(state): State<ServerState>) -> impl IntoResponse {
    Json(state.os_config.as_ref().clone())
}

/// List available agents
pub async fn list_agents(State(state): State<ServerState>) -> impl IntoResponse {
    let agents = state.agent_registry.get_all_info();

    Json(ListAgentsResponse {
        total: agents.len(),
        agents,
    })
}

/// Get a single agent
pub async fn get_agent(
    State(state): State<ServerState>,
    Path(agent_id): Path<String>,
) -> Response {
    match state.agent_registry.get(&agent_id) {
        Some(agent) => Json(crate::api::AgentInfo::from(agent)).into_response(),
        None => agent_not_found(&agent_id),
    }
}

/// Run an agent, either to completion or as an SSE stream of run events
pub async fn create_run(
    State(state): State<ServerState>,
    Path(agent_id): Path<String>,
    Json(request): Json<RunRequest>,
) -> Response {
    let Some(agent) = state.agent_registry.get(&agent_id).cloned() else {
        return agent_not_found(&agent_id);
    };

    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message must not be empty", None);
    }

    let input = RunInput {
        message: request.message,
        session_id: request.session_id,
        user_id: request.user_id,
        run_id: None,
    };

    info!(%agent_id, stream = request.stream, "run requested");

    if request.stream {
        return sse_response(agent.run_stream(input)).into_response();
    }

    match agent.run(input).await {
        Ok(output) => Json(RunResponse::new(&agent_id, output)).into_response(),
        Err(e @ AgentError::SessionMismatch { .. }) => {
            error_response(StatusCode::BAD_REQUEST, &e.to_string(), None)
        }
        Err(e) => {
            error!(%agent_id, error = %e, "run failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Agent run failed",
                Some(e.to_string()),
            )
        }
    }
}

/// List sessions, optionally filtered by `agent_id` and `user_id`
pub async fn list_sessions(
    State(state): State<ServerState>,
    Query(filter): Query<SessionFilter>,
) -> Response {
    match state.agent_registry.list_sessions(&filter).await {
        Ok(sessions) => {
            let sessions: Vec<SessionSummary> = sessions.iter().map(SessionSummary::from).collect();
            Json(ListSessionsResponse {
                total: sessions.len(),
                sessions,
            })
            .into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// Get a session with all of its runs
pub async fn get_session(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.agent_registry.find_session(&session_id).await {
        Ok(Some((_, session))) => Json(session).into_response(),
        Ok(None) => session_not_found(&session_id),
        Err(e) => storage_error(e),
    }
}

/// Delete a session
pub async fn delete_session(
    State(state): State<ServerState>,
    Path(session_id): Path<String>,
) -> Response {
    let agent = match state.agent_registry.find_session(&session_id).await {
        Ok(Some((agent, _))) => agent,
        Ok(None) => return session_not_found(&session_id),
        Err(e) => return storage_error(e),
    };

    match agent.storage().delete_session(&session_id).await {
        Ok(()) => {
            info!(%session_id, agent_id = %agent.id(), "session deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(StorageError::SessionNotFound(_)) => session_not_found(&session_id),
        Err(e) => storage_error(e),
    }
}

/// Wrap a stream of serializable events into an SSE response
pub(crate) fn sse_response<S, T>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + 'static,
{
    let stream = events.map(|event| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data("error serializing event")))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn agent_not_found(agent_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("Agent '{}' not found", agent_id),
        None,
    )
}

fn session_not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        &format!("Session '{}' not found", session_id),
        None,
    )
}

fn storage_error(err: StorageError) -> Response {
    error!(error = %err, "storage failure");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Storage failure",
        Some(err.to_string()),
    )
}

/// Helper function to create error responses
pub(crate) fn error_response(status: StatusCode, message: &str, details: Option<String>) -> Response {
    let error_response = ErrorResponse {
        error: message.to_string(),
        details,
    };

    (status, Json(error_response)).into_response()
}
