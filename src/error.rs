//! Error types for email-capture.

use std::time::Duration;

/// Top-level error type, used by the runner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Invalid event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },
}

/// Failures of the extraction capability.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Extraction timed out after {after:?}")]
    Timeout { after: Duration },
}

/// Failures of the update capability.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Activity update rejected: {reason}")]
    Validation { reason: String },

    #[error("Activity store error: {0}")]
    Store(#[from] DatabaseError),
}

/// Failure of a single handler invocation.
///
/// Both variants are transparent: the capability's error passes through
/// with its own message.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Result type alias for the runner.
pub type Result<T> = std::result::Result<T, Error>;
