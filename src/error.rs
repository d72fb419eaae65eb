//! Error types for inbox-tasks.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Task extraction errors. Every variant is fatal for the request.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Extraction call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Malformed create_tasks arguments: {0}")]
    MalformedArguments(serde_json::Error),

    #[error("Model called unexpected tool: {0}")]
    UnexpectedTool(String),
}

/// Errors decoding the inbound email event.
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    #[error("Invalid inbound envelope: {0}")]
    InvalidEnvelope(serde_json::Error),

    #[error("Invalid inbound email payload: {0}")]
    InvalidPayload(serde_json::Error),
}

/// Fatal request-handling errors. No partial response is produced for these.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Inbound(#[from] InboundError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
