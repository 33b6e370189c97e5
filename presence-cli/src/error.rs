//! CLI Error Types

use thiserror::Error;

use presence_sync::{ApiError, ConfigError, SyncError};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Access API error: {0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    /// A refresh cycle stopped before persisting
    #[error("Refresh cycle failed: {message}")]
    Cycle { message: String },

    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub fn cycle(message: impl Into<String>) -> Self {
        CliError::Cycle {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        CliError::Logging {
            message: message.into(),
        }
    }

    /// Get exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Logging { .. } => 1,
            CliError::Sync(SyncError::UnknownGroup(_)) => 2,
            CliError::Api(_) | CliError::Sync(SyncError::Api(_)) => 3,
            CliError::Cycle { .. } => 4,
            CliError::Sync(_) | CliError::Json(_) | CliError::Io(_) => 5,
        }
    }
}
