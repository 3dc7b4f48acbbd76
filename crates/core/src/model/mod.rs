//! Chat model abstraction module
//!
//! This module provides the `ChatModel` trait that every model client implements,
//! the message types exchanged with a model, and the built-in clients.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod openai;
pub mod scripted;
pub mod sse;

pub use openai::{OpenAIChat, OpenAIConfig};
pub use scripted::ScriptedModel;
pub use sse::SseDecoder;

/// Role of a chat message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Errors raised by model clients
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport failure talking to the model API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Model API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The response stream was malformed
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Stream of content deltas produced by a model
pub type DeltaStream = BoxStream<'static, ModelResult<String>>;

/// Core trait for chat model clients
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier sent to the provider (e.g. "gpt-4o")
    fn id(&self) -> &str;

    /// Provider name, used for display only
    fn provider(&self) -> &str {
        "openai"
    }

    /// Start a streaming completion for the given prompt
    ///
    /// Returns a stream of content deltas. Errors that happen before the first
    /// byte is received are returned directly; later errors are yielded by the
    /// stream.
    async fn stream(&self, messages: &[ChatMessage]) -> ModelResult<DeltaStream>;
}
