//! OpenAI-compatible chat completions client
//!
//! Talks to any server exposing `POST {base_url}/chat/completions` with
//! streaming enabled.

use std::fmt::{self, Debug};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ChatMessage, ChatModel, DeltaStream, ModelError, ModelResult, SseDecoder};

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for the OpenAI-compatible client
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    pub(crate) model: String,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl OpenAIConfig {
    /// Create a configuration for the given model against the public endpoint
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }

    /// Set a custom base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API key sent as a bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set an optional API key
    pub fn with_optional_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Parse one streamed chunk into its content delta, if it carries one
fn parse_chunk(data: &str) -> ModelResult<Option<String>> {
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(ModelError::InvalidResponse(format!(
            "error event in stream: {error}"
        )));
    }
    let content: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    Ok((!content.is_empty()).then_some(content))
}

/// Chat model client for OpenAI-compatible APIs
#[derive(Clone, Debug)]
pub struct OpenAIChat {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIChat {
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl ChatModel for OpenAIChat {
    fn id(&self) -> &str {
        &self.config.model
    }

    async fn stream(&self, messages: &[ChatMessage]) -> ModelResult<DeltaStream> {
        let url = self.config.completions_url();
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages,
            stream: true,
        };

        debug!(model = %self.config.model, %url, messages = messages.len(), "sending chat completion request");

        let mut builder = self
            .client
            .post(&url)
            .header(header::ACCEPT, "text/event-stream")
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion request rejected");
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut done = false;
            while !done {
                let Some(chunk) = body.next().await else {
                    break;
                };
                let events = match chunk {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => Err(ModelError::from(e)),
                };
                let events = match events {
                    Ok(events) => events,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                for data in events {
                    if data == "[DONE]" {
                        done = true;
                        break;
                    }
                    match parse_chunk(&data) {
                        Ok(Some(delta)) => yield Ok(delta),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
            if !done {
                match decoder.finish() {
                    Ok(Some(data)) if data != "[DONE]" => match parse_chunk(&data) {
                        Ok(Some(delta)) => yield Ok(delta),
                        Ok(None) => {}
                        Err(e) => yield Err(e),
                    },
                    Ok(_) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(stream.boxed())
    }
}
