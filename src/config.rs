//! Configuration types.
//!
//! Everything here is resolved once at start-up and handed to the request
//! handler by value. Nothing reads the environment while a request is in
//! flight.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default chat-completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default chat-completion API root.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default Todoist REST API root.
pub const DEFAULT_TODOIST_BASE_URL: &str = "https://api.todoist.com/rest/v2";

/// Default timeout applied to every outbound HTTP call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Configuration for the extraction (chat-completion) service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
        }
    }
}

/// Configuration for the task-management service binding.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub base_url: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TODOIST_BASE_URL.to_string(),
        }
    }
}

/// Read-only map from envelope address to task-service bearer token.
///
/// Keys are matched exactly (case-sensitive, no normalisation).
#[derive(Debug, Clone, Default)]
pub struct CredentialMap {
    tokens: HashMap<String, SecretString>,
}

impl CredentialMap {
    /// Build a map from `(address, token)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tokens = pairs
            .into_iter()
            .map(|(address, token)| (address.into(), SecretString::from(token.into())))
            .collect();
        Self { tokens }
    }

    /// Parse a JSON object of `{"address": "token", ...}`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let parsed: HashMap<String, String> = serde_json::from_str(raw)
            .map_err(|e| ConfigError::ParseError(format!("credential map: {e}")))?;
        Ok(Self::from_pairs(parsed))
    }

    /// Load the JSON object form from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn lookup(&self, address: &str) -> Option<&SecretString> {
        self.tokens.get(address)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub llm: LlmConfig,
    pub sink: SinkConfig,
    pub credentials: CredentialMap,
    /// Address the HTTP ingress listens on.
    pub bind_addr: SocketAddr,
    /// Timeout for each outbound HTTP call.
    pub request_timeout: Duration,
}

impl ServiceConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let mut llm = LlmConfig::new(api_key);
        if let Some(model) = lookup("INBOX_TASKS_MODEL") {
            llm.model = model;
        }
        if let Some(base_url) = lookup("INBOX_TASKS_LLM_BASE_URL") {
            llm.base_url = base_url;
        }

        let sink = SinkConfig {
            base_url: lookup("INBOX_TASKS_TODOIST_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TODOIST_BASE_URL.to_string()),
        };

        let credentials = match (lookup("TASK_TOKEN_MAP"), lookup("TASK_TOKEN_MAP_FILE")) {
            (Some(raw), _) => CredentialMap::from_json(&raw)?,
            (None, Some(path)) => CredentialMap::from_file(Path::new(&path))?,
            (None, None) => {
                tracing::warn!(
                    "Neither TASK_TOKEN_MAP nor TASK_TOKEN_MAP_FILE set; every sender will be unmapped"
                );
                CredentialMap::default()
            }
        };

        let bind_raw = lookup("INBOX_TASKS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "INBOX_TASKS_BIND".to_string(),
                message: e.to_string(),
            })?;

        let timeout_secs = match lookup("INBOX_TASKS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "INBOX_TASKS_REQUEST_TIMEOUT_SECS".to_string(),
                    message: e.to_string(),
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            llm,
            sink,
            credentials,
            bind_addr,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Build the shared HTTP client with the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "http_client".to_string(),
                message: e.to_string(),
            })
    }
}
