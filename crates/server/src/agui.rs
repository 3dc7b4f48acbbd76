//! AG-UI interface
//!
//! Exposes one agent through the AG-UI event protocol: the client posts a
//! `RunAgentInput` and receives the run as a stream of SSE events.

use agent_os_core::{Agent, RunEvent, RunInput};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use crate::handlers::{error_response, sse_response};

/// Route the AG-UI run endpoint is mounted on
pub const AGUI_ROUTE: &str = "/agui";

/// Message in an AG-UI conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AguiMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

impl AguiMessage {
    /// Text content, joining the text parts of multi-part content
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Value::String(text) => Some(text.clone()),
            Value::Array(parts) => {
                let text: Vec<&str> = parts
                    .iter()
                    .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect();
                (!text.is_empty()).then(|| text.join("\n"))
            }
            _ => None,
        }
    }
}

/// Body of an AG-UI run request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentInput {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<AguiMessage>,
    #[serde(default)]
    pub state: Value,
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub context: Vec<Value>,
    #[serde(default)]
    pub forwarded_props: Value,
}

impl RunAgentInput {
    /// Text of the most recent user message
    pub fn last_user_message(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == "user")
            .and_then(AguiMessage::text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// AG-UI protocol event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AguiEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted { thread_id: String, run_id: String },
    #[serde(rename_all = "camelCase")]
    TextMessageStart { message_id: String, role: String },
    #[serde(rename_all = "camelCase")]
    TextMessageContent { message_id: String, delta: String },
    #[serde(rename_all = "camelCase")]
    TextMessageEnd { message_id: String },
    #[serde(rename_all = "camelCase")]
    RunFinished { thread_id: String, run_id: String },
    RunError { message: String },
}

/// Translates agent run events into AG-UI events
///
/// The assistant message is opened on run start and closed before the run
/// finishes. Empty deltas are dropped.
#[derive(Debug)]
pub struct AguiTranslator {
    thread_id: String,
    run_id: String,
    message_id: String,
    message_open: bool,
}

impl AguiTranslator {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            message_id: Uuid::new_v4().to_string(),
            message_open: false,
        }
    }

    pub fn translate(&mut self, event: RunEvent) -> Vec<AguiEvent> {
        match event {
            RunEvent::RunStarted { .. } => {
                self.message_open = true;
                vec![
                    AguiEvent::RunStarted {
                        thread_id: self.thread_id.clone(),
                        run_id: self.run_id.clone(),
                    },
                    AguiEvent::TextMessageStart {
                        message_id: self.message_id.clone(),
                        role: "assistant".to_string(),
                    },
                ]
            }
            RunEvent::RunContent { content, .. } if content.is_empty() => Vec::new(),
            RunEvent::RunContent { content, .. } => vec![AguiEvent::TextMessageContent {
                message_id: self.message_id.clone(),
                delta: content,
            }],
            RunEvent::RunCompleted { .. } => {
                let mut events = self.close_message();
                events.push(AguiEvent::RunFinished {
                    thread_id: self.thread_id.clone(),
                    run_id: self.run_id.clone(),
                });
                events
            }
            RunEvent::RunError { error, .. } => {
                self.message_open = false;
                vec![AguiEvent::RunError { message: error }]
            }
        }
    }

    fn close_message(&mut self) -> Vec<AguiEvent> {
        if !std::mem::replace(&mut self.message_open, false) {
            return Vec::new();
        }
        vec![AguiEvent::TextMessageEnd {
            message_id: self.message_id.clone(),
        }]
    }
}

/// Handle an AG-UI run request
pub async fn run_agent(State(agent): State<Agent>, Json(input): Json<RunAgentInput>) -> Response {
    let Some(message) = input.last_user_message() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No user message found in messages",
            None,
        );
    };

    let thread_id = input
        .thread_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let run_id = input.run_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(agent_id = %agent.id(), %thread_id, %run_id, "AG-UI run requested");

    let run = RunInput::new(message)
        .with_session_id(thread_id.clone())
        .with_run_id(run_id.clone());

    let mut translator = AguiTranslator::new(thread_id, run_id);
    let events = agent
        .run_stream(run)
        .flat_map(move |event| futures_util::stream::iter(translator.translate(event)));

    sse_response(events).into_response()
}

/// AG-UI availability check
pub async fn status() -> impl IntoResponse {
    Json(json!({ "status": "available" }))
}

/// Build the AG-UI routes for one agent
pub fn router(agent: Agent) -> Router {
    Router::new()
        .route(AGUI_ROUTE, post(run_agent))
        .route("/status", get(status))
        .with_state(agent)
}
