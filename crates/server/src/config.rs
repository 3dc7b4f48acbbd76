//! Launcher settings resolved from the process environment
//!
//! `Settings::from_lookup` takes any lookup function so tests can resolve
//! settings without touching the real environment.

use std::fmt;
use std::num::ParseIntError;

use agent_os_core::model::openai::DEFAULT_MODEL;
use agent_os_core::OpenAIConfig;
use thiserror::Error;

pub const BASE_URL_VAR: &str = "BLOCKETHER_LLM_API_BASE_URL";
pub const API_KEY_VAR: &str = "BLOCKETHER_LLM_API_KEY";
pub const MODEL_VAR: &str = "BLOCKETHER_LLM_MODEL";
pub const PORT_VAR: &str = "PORT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration errors, all raised before any socket is opened
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set.")]
    MissingVar(&'static str),

    #[error("{var} must be a TCP port number, got {value:?}: {source}")]
    InvalidPort {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

/// Resolved launcher settings
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model_id: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = get(BASE_URL_VAR).ok_or(ConfigError::MissingVar(BASE_URL_VAR))?;
        let api_key = get(API_KEY_VAR);
        let model_id = get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let port = match get(PORT_VAR) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort {
                    var: PORT_VAR,
                    value,
                    source,
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            base_url,
            api_key,
            model_id,
            host: DEFAULT_HOST.to_string(),
            port,
        })
    }

    /// Address the server binds, e.g. `0.0.0.0:8080`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model client configuration bound to the configured endpoint
    pub fn model_config(&self) -> OpenAIConfig {
        OpenAIConfig::new(self.model_id.clone())
            .with_base_url(self.base_url.clone())
            .with_optional_api_key(self.api_key.clone())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_id", &self.model_id)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}
