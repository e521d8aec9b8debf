//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A record failed entity validation at the store boundary.
    #[error("Validation error: {0}")]
    Model(#[from] cagelocke_core::Error),

    /// Backing database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Remote store unreachable or rejected the connection.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The binding does not serve this request.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;
