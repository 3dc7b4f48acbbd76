//! # agent-os-core
//!
//! Building blocks for serving conversational agents.
//!
//! ## Features
//!
//! - `ChatModel` trait with a streaming OpenAI-compatible client
//! - `Storage` trait with an in-memory session backend
//! - `Agent` that replays session history and streams run events
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use agent_os_core::{Agent, AgentConfig, InMemoryStorage, OpenAIChat, OpenAIConfig, RunInput};
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(InMemoryStorage::new());
//!     let model = Arc::new(OpenAIChat::new(
//!         OpenAIConfig::new("gpt-4o").with_base_url("http://localhost:4000/v1"),
//!     ));
//!
//!     let agent = Agent::new(AgentConfig::default(), model, storage);
//!     let output = agent.run(RunInput::new("Hello!")).await.unwrap();
//!     println!("{}", output.content);
//! }
//! ```
//!
//! Nothing in this crate opens a network listener.

pub mod agent;
pub mod model;
pub mod storage;

// Convenience re-exports for common types
pub use agent::{Agent, AgentConfig, AgentError, AgentResult, RunEvent, RunInput, RunOutput};

pub use model::{
    ChatMessage, ChatModel, DeltaStream, ModelError, ModelResult, OpenAIChat, OpenAIConfig, Role,
    ScriptedModel,
};

pub use storage::{
    InMemoryStorage, RunRecord, RunStatus, Session, SessionFilter, Storage, StorageError,
    StorageResult,
};
