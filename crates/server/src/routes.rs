//! Route definitions and router setup

use axum::{
    Router,
    routing::{get, post},
};

use crate::ServerState;
use crate::handlers;

/// Create the REST router shared by every application
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        // Application
        .route("/health", get(handlers::health_check))
        .route("/config", get(handlers::get_config))
        // Agent operations
        .route("/agents", get(handlers::list_agents))
        .route("/agents/{agent_id}", get(handlers::get_agent))
        .route("/agents/{agent_id}/runs", post(handlers::create_run))
        // Session operations
        .route("/sessions", get(handlers::list_sessions))
        .route(
            "/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agent_os_core::{Agent, AgentConfig, InMemoryStorage, ScriptedModel, Session, Storage};
    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{AgentOs, Interface};

    fn app(enable_mcp_server: bool) -> Router {
        let agent = Agent::new(
            AgentConfig::new("assistant"),
            Arc::new(ScriptedModel::reply(["Hel", "lo"])),
            Arc::new(InMemoryStorage::new()),
        );
        AgentOs::builder()
            .id("test-os")
            .description("Example app with MCP enabled")
            .agent(agent.clone())
            .enable_mcp_server(enable_mcp_server)
            .interface(Interface::agui(agent))
            .build()
            .unwrap()
            .get_app()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn sse_payloads(body: &str) -> Vec<Value> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health_and_config() {
        let app = app(true);

        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/config", None).await;
        assert_eq!(status, StatusCode::OK);
        let config: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(config["os_id"], "test-os");
        assert_eq!(config["agents"][0]["agent_id"], "assistant");
        assert_eq!(config["interfaces"][0]["type"], "agui");
        assert_eq!(config["mcp_server"], true);
    }

    #[tokio::test]
    async fn test_agents() {
        let app = app(true);

        let (status, body) = send(&app, "GET", "/agents", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["total"], 1);

        let (status, _) = send(&app, "GET", "/agents/assistant", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/agents/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("nobody"));
    }

    #[tokio::test]
    async fn test_run_and_session_lifecycle() {
        let app = app(true);

        let (status, body) = send(
            &app,
            "POST",
            "/agents/assistant/runs",
            Some(json!({"message": "hi", "user_id": "alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let run: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(run["content"], "Hello");
        let session_id = run["session_id"].as_str().unwrap().to_string();

        let (_, body) = send(&app, "GET", "/sessions?user_id=alice", None).await;
        let list: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(list["total"], 1);
        assert_eq!(list["sessions"][0]["run_count"], 1);

        let (_, body) = send(&app, "GET", "/sessions?user_id=bob", None).await;
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["total"], 0);

        let uri = format!("/sessions/{session_id}");
        let (status, body) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let session: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(session["runs"][0]["output"], "Hello");

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_on_session_of_other_agent_is_bad_request() {
        let storage = InMemoryStorage::new();
        storage
            .upsert_session(Session::new("shared", "someone-else", None))
            .await
            .unwrap();
        let agent = Agent::new(
            AgentConfig::new("assistant"),
            Arc::new(ScriptedModel::reply(["ok"])),
            Arc::new(storage),
        );
        let app = AgentOs::builder().agent(agent).build().unwrap().get_app();

        let (status, body) = send(
            &app,
            "POST",
            "/agents/assistant/runs",
            Some(json!({"message": "hi", "session_id": "shared"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: Value = serde_json::from_str(&body).unwrap();
        assert!(error["error"].as_str().unwrap().contains("someone-else"));
    }

    #[tokio::test]
    async fn test_run_rejects_empty_message() {
        let app = app(true);
        let (status, _) = send(
            &app,
            "POST",
            "/agents/assistant/runs",
            Some(json!({"message": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_streaming_run() {
        let app = app(true);
        let (status, body) = send(
            &app,
            "POST",
            "/agents/assistant/runs",
            Some(json!({"message": "hi", "stream": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let events: Vec<String> = sse_payloads(&body)
            .iter()
            .map(|e| e["event"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            events,
            vec!["run_started", "run_content", "run_content", "run_completed"]
        );
    }

    #[tokio::test]
    async fn test_agui_run() {
        let app = app(true);

        let (status, body) = send(&app, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("available"));

        let (status, body) = send(
            &app,
            "POST",
            "/agui",
            Some(json!({
                "threadId": "thread-1",
                "runId": "run-1",
                "messages": [{"id": "m1", "role": "user", "content": "hi"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let events = sse_payloads(&body);
        let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(
            types,
            vec![
                "RUN_STARTED",
                "TEXT_MESSAGE_START",
                "TEXT_MESSAGE_CONTENT",
                "TEXT_MESSAGE_CONTENT",
                "TEXT_MESSAGE_END",
                "RUN_FINISHED"
            ]
        );
        assert_eq!(events[0]["threadId"], "thread-1");

        // The thread id becomes the session id.
        let (status, _) = send(&app, "GET", "/sessions/thread-1", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_agui_requires_user_message() {
        let app = app(true);
        let (status, _) = send(&app, "POST", "/agui", Some(json!({"messages": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_mcp_endpoint() {
        let app = app(true);
        let initialize = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-06-18",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.0.0" }
            }
        });
        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::HOST, "localhost")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json, text/event-stream")
            .body(Body::from(initialize.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("mcp-session-id"));
    }

    #[tokio::test]
    async fn test_mcp_disabled() {
        let app = app(false);
        let (status, _) = send(
            &app,
            "POST",
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
