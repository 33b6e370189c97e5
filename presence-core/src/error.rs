//! Core error types

use thiserror::Error;

/// Errors raised by the pure domain layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An access event timestamp could not be parsed
    #[error("Invalid event timestamp: {0}")]
    InvalidTimestamp(String),

    /// Unknown status policy name
    #[error("Invalid status policy: {0}")]
    InvalidPolicy(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;
