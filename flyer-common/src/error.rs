//! Common error types for the flyer services

use thiserror::Error;

/// Common result type for flyer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across flyer services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tour date that parses but has no usable calendar date
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error (corrupt row, unexpected state)
    #[error("Internal error: {0}")]
    Internal(String),
}
