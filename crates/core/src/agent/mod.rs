//! Conversational agent module
//!
//! An `Agent` binds a chat model to a storage backend. Each run loads (or
//! creates) a session, replays recent history into the prompt, streams the
//! model's answer and records the run in the session.

use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub mod config;
pub mod error;
pub mod event;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use event::RunEvent;

use crate::model::{ChatMessage, ChatModel, ModelError};
use crate::storage::{RunRecord, Session, Storage};

/// Input for a single agent run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunInput {
    /// User message
    pub message: String,

    /// Session to continue; a new session is created when absent or unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Owner of a newly created session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Caller-chosen run id; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl RunInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub run_id: String,
    pub session_id: String,
    pub content: String,
}

/// Conversational agent backed by a chat model and a session store
#[derive(Clone)]
pub struct Agent {
    config: Arc<AgentConfig>,
    model: Arc<dyn ChatModel>,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("model", &self.model.id())
            .field("storage", &self.storage.name())
            .finish()
    }
}

impl Agent {
    /// Create an agent from a configuration, a model and a storage backend
    pub fn new(config: AgentConfig, model: Arc<dyn ChatModel>, storage: Arc<dyn Storage>) -> Self {
        Self {
            config: Arc::new(config),
            model,
            storage,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn name(&self) -> Option<&str> {
        self.config.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.config.description.as_deref()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<dyn ChatModel> {
        &self.model
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Run the agent to completion and return the full answer
    ///
    /// Failures keep their kind: a session owned by another agent is
    /// `SessionMismatch`, a model failure is `Model`.
    pub async fn run(&self, input: RunInput) -> AgentResult<RunOutput> {
        if input.message.trim().is_empty() {
            return Err(AgentError::EmptyInput);
        }

        let run_id = input.run_id.unwrap_or_else(new_id);
        let session_id = input.session_id.unwrap_or_else(new_id);
        let session = self.load_session(&session_id, input.user_id).await?;

        let mut events = self.turn(session, run_id, input.message);
        while let Some(event) = events.next().await {
            if let RunEvent::RunCompleted {
                run_id,
                session_id,
                content,
            } = event?
            {
                return Ok(RunOutput {
                    run_id,
                    session_id,
                    content,
                });
            }
        }

        Err(AgentError::RunFailed("run ended without a result".to_string()))
    }

    /// Run the agent and stream lifecycle events
    ///
    /// The stream owns a clone of the agent, so it can outlive `self`.
    pub fn run_stream(&self, input: RunInput) -> BoxStream<'static, RunEvent> {
        let agent = self.clone();

        let stream = async_stream::stream! {
            let run_id = input.run_id.unwrap_or_else(new_id);
            let session_id = input.session_id.unwrap_or_else(new_id);

            if input.message.trim().is_empty() {
                yield RunEvent::RunError {
                    run_id,
                    session_id,
                    error: AgentError::EmptyInput.to_string(),
                };
                return;
            }

            let session = match agent.load_session(&session_id, input.user_id).await {
                Ok(session) => session,
                Err(e) => {
                    warn!(agent_id = %agent.id(), %session_id, error = %e, "failed to load session");
                    yield RunEvent::RunError { run_id, session_id, error: e.to_string() };
                    return;
                }
            };

            let mut events = agent.turn(session, run_id.clone(), input.message);
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => yield event,
                    Err(e) => {
                        yield RunEvent::RunError {
                            run_id: run_id.clone(),
                            session_id: session_id.clone(),
                            error: e.to_string(),
                        };
                        return;
                    }
                }
            }
        };

        stream.boxed()
    }

    /// Prompt the model for one user message and record the run
    ///
    /// Yields `RunStarted`, the content deltas, then `RunCompleted`. A model
    /// or storage failure ends the stream with an error after the run has
    /// been recorded as failed.
    fn turn(
        &self,
        session: Session,
        run_id: String,
        message: String,
    ) -> BoxStream<'static, AgentResult<RunEvent>> {
        let agent = self.clone();

        let stream = async_stream::stream! {
            let session_id = session.session_id.clone();
            let prompt = agent.build_prompt(&session, &message);
            let mut record = RunRecord::start(run_id.clone(), message);

            info!(agent_id = %agent.id(), %run_id, %session_id, prompt_messages = prompt.len(), "run started");
            yield Ok(RunEvent::RunStarted {
                run_id: run_id.clone(),
                session_id: session_id.clone(),
                agent_id: agent.id().to_string(),
                model: agent.model.id().to_string(),
            });

            let mut content = String::new();
            let mut failure: Option<ModelError> = None;
            match agent.model.stream(&prompt).await {
                Ok(mut deltas) => {
                    while let Some(delta) = deltas.next().await {
                        match delta {
                            Ok(delta) => {
                                content.push_str(&delta);
                                yield Ok(RunEvent::RunContent {
                                    run_id: run_id.clone(),
                                    session_id: session_id.clone(),
                                    content: delta,
                                });
                            }
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        }
                    }
                }
                Err(e) => failure = Some(e),
            }

            match &failure {
                None => record.complete(content.clone()),
                Some(e) => record.fail(e.to_string()),
            }

            if let Err(e) = agent.storage.append_run(session, record).await {
                warn!(agent_id = %agent.id(), %session_id, error = %e, "failed to record run");
                yield Err(AgentError::Storage(e));
                return;
            }

            match failure {
                None => {
                    info!(agent_id = %agent.id(), %run_id, chars = content.len(), "run completed");
                    yield Ok(RunEvent::RunCompleted { run_id, session_id, content });
                }
                Some(e) => {
                    warn!(agent_id = %agent.id(), %run_id, error = %e, "run failed");
                    yield Err(AgentError::Model(e));
                }
            }
        };

        stream.boxed()
    }

    async fn load_session(&self, session_id: &str, user_id: Option<String>) -> AgentResult<Session> {
        match self.storage.get_session(session_id).await? {
            Some(session) if session.agent_id != self.id() => Err(AgentError::SessionMismatch {
                session_id: session_id.to_string(),
                owner: session.agent_id,
            }),
            Some(session) => Ok(session),
            None => {
                debug!(agent_id = %self.id(), %session_id, "creating session");
                Ok(Session::new(session_id, self.id(), user_id))
            }
        }
    }

    fn build_prompt(&self, session: &Session, message: &str) -> Vec<ChatMessage> {
        let mut prompt = Vec::new();
        if let Some(instructions) = &self.config.instructions {
            prompt.push(ChatMessage::system(instructions.clone()));
        }
        prompt.extend(session.history(self.config.history_runs));
        prompt.push(ChatMessage::user(message));
        prompt
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests;
