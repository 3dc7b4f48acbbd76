//! Scripted model for tests and offline demos
//!
//! Replies with a fixed sequence of deltas (or a fixed failure) and records
//! every prompt it receives.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use super::{ChatMessage, ChatModel, DeltaStream, ModelError, ModelResult};

#[derive(Debug, Clone)]
enum Script {
    Reply(Vec<String>),
    Fail(String),
}

/// Deterministic in-process chat model
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    script: Script,
    prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedModel {
    /// A model that streams the given deltas for every request
    pub fn reply<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Script::Reply(deltas.into_iter().map(Into::into).collect()),
            prompts: Arc::default(),
        }
    }

    /// A model whose stream fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            script: Script::Fail(message.into()),
            prompts: Arc::default(),
        }
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    fn provider(&self) -> &str {
        "scripted"
    }

    async fn stream(&self, messages: &[ChatMessage]) -> ModelResult<DeltaStream> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(messages.to_vec());
        }

        let items: Vec<ModelResult<String>> = match &self.script {
            Script::Reply(deltas) => deltas.iter().cloned().map(Ok).collect(),
            Script::Fail(message) => vec![Err(ModelError::InvalidResponse(message.clone()))],
        };
        Ok(stream::iter(items).boxed())
    }
}
