//! Error types for the companion voice interpreter

use thiserror::Error;

/// Result type alias for companion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the companion voice interpreter
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona not found
    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    /// Malformed command catalog or response table
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Speech recognizer could not begin capture
    #[error("recognizer failed to start: {0}")]
    RecognizerStart(String),

    /// Speech recognizer reported a mid-session failure
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Downstream action handler failed
    #[error("handler error: {0}")]
    Handler(String),

    /// Integrity check failed in a collaborating storage layer
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
