//! Sync Error Types
//!
//! Error taxonomy for the synchronization engine:
//! - `ApiError` classifies access backend failures
//! - `PersistenceError` covers the durable snapshot and credential files
//! - `ConfigError` is the only class that is fatal, at startup
//! - `SyncError` is what the service surfaces to its callers

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use presence_core::CoreError;

/// Access backend errors
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// 401 from the backend; the bearer token is no longer valid
    #[error("Authorization expired while fetching '{path}'")]
    AuthExpired { path: String },

    /// Any other non-success status
    #[error("Fetching '{path}' failed: {status}")]
    RequestFailed { path: String, status: u16, body: Value },

    /// Connection-level failure, no response received
    #[error("Fetching '{path}' failed: {message}")]
    Transport { path: String, message: String },

    /// Response received but its body did not have the expected shape
    #[error("Unexpected response from '{path}': {message}")]
    Decode { path: String, message: String },
}

impl ApiError {
    pub fn request_failed(path: impl Into<String>, status: u16, body: Value) -> Self {
        ApiError::RequestFailed {
            path: path.into(),
            status,
            body,
        }
    }

    pub fn transport(path: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Transport {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired { .. })
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthExpired { .. } => Some(401),
            ApiError::RequestFailed { status, .. } => Some(*status),
            ApiError::Transport { .. } | ApiError::Decode { .. } => None,
        }
    }
}

/// Durable storage errors
#[derive(Debug, Error, Clone)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting is not provided
    #[error("Missing configuration: {0}")]
    Missing(String),

    /// A setting is present but cannot be used
    #[error("Invalid configuration {key}: {message}")]
    Invalid { key: String, message: String },

    /// Site file could not be loaded
    #[error("Failed to load site file {path}: {message}")]
    SiteFile { path: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the presence service
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The requested group key is not configured
    #[error("Unknown group: {0}")]
    UnknownGroup(String),
}

/// Error body handed to consumers: a message plus diagnostic detail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
    pub detail: Value,
}

impl SyncError {
    /// Status a routing layer should answer with
    pub fn http_status(&self) -> u16 {
        match self {
            SyncError::UnknownGroup(_) => 400,
            SyncError::Api(err) => err.status().unwrap_or(502),
            _ => 500,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        let detail = match self {
            SyncError::Api(ApiError::RequestFailed { path, status, body }) => {
                serde_json::json!({ "kind": "request_failed", "path": path, "status": status, "body": body })
            }
            SyncError::Api(ApiError::AuthExpired { path }) => {
                serde_json::json!({ "kind": "auth_expired", "path": path })
            }
            SyncError::Api(ApiError::Transport { path, message }) => {
                serde_json::json!({ "kind": "transport", "path": path, "message": message })
            }
            SyncError::Api(ApiError::Decode { path, message }) => {
                serde_json::json!({ "kind": "decode", "path": path, "message": message })
            }
            SyncError::Persistence(err) => {
                serde_json::json!({ "kind": "persistence", "message": err.to_string() })
            }
            SyncError::Config(err) => {
                serde_json::json!({ "kind": "config", "message": err.to_string() })
            }
            SyncError::Core(err) => serde_json::json!({ "kind": "core", "message": err.to_string() }),
            SyncError::UnknownGroup(key) => {
                serde_json::json!({ "kind": "unknown_group", "group": key })
            }
        };

        ErrorPayload {
            message: self.to_string(),
            detail,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type SyncResult<T> = Result<T, SyncError>;
