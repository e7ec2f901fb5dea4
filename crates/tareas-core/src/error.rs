//! Error types for tareas.

use thiserror::Error;

/// Result type alias using the tareas Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tareas operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Task not found
    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    /// Request validation failed (missing or malformed field)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image store operation failed
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
