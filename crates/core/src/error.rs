//! Error types for the propchat CLI.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM, listings/retrieval, and
//! prompt errors.

use thiserror::Error;

/// Unified error type for the propchat CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Note that most query-time failures never surface here: a filter field
/// that fails to parse is simply absent, a candidate with malformed price
/// metadata is silently dropped, and unparseable LLM output degrades to a
/// placeholder payload. `AppError` is for infrastructure failures.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (fatal at startup: missing index,
    /// invalid config file, missing API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Listing index and retrieval errors
    #[error("Listings error: {0}")]
    Listings(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
