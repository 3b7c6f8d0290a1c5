//! Error types for atelier.

use thiserror::Error;

/// Common error type for atelier.
#[derive(Error, Debug)]
pub enum AtelierError {
    /// Database error.
    ///
    /// Wraps errors from the database backend; sqlx errors convert
    /// automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),
}

impl From<sqlx::Error> for AtelierError {
    fn from(e: sqlx::Error) -> Self {
        AtelierError::Database(e.to_string())
    }
}

/// Result type alias for atelier operations.
pub type Result<T> = std::result::Result<T, AtelierError>;
