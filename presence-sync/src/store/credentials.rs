//! Credential persistence
//!
//! A freshly exchanged bearer token is written back to the environment
//! file so the next process start reuses it.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use super::write_atomic;
use crate::config::TOKEN_ENV_KEY;
use crate::error::{PersistenceError, PersistenceResult};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store the current bearer token
    async fn persist_token(&self, token: &str) -> PersistenceResult<()>;
}

/// Writes `ACCESS_API_TOKEN=<token>` into a dotenv-style file
///
/// The first line assigning the key is replaced in place; otherwise a new
/// line is appended. Every other line is kept as it was.
pub struct EnvFileCredentialStore {
    path: PathBuf,
    key: String,
}

impl EnvFileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key: TOKEN_ENV_KEY.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewrite(&self, existing: &str, token: &str) -> String {
        let prefix = format!("{}=", self.key);
        let assignment = format!("{}{}", prefix, token);
        let normalized = existing.replace("\r\n", "\n");

        let mut lines: Vec<String> = normalized.lines().map(str::to_string).collect();
        match lines
            .iter()
            .position(|line| line.trim_start().starts_with(&prefix))
        {
            Some(index) => lines[index] = assignment,
            None => lines.push(assignment),
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[async_trait]
impl CredentialStore for EnvFileCredentialStore {
    async fn persist_token(&self, token: &str) -> PersistenceResult<()> {
        let existing = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(PersistenceError::Read {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        let updated = self.rewrite(&existing, token);
        write_atomic(&self.path, updated.as_bytes()).await?;

        info!(path = %self.path.display(), key = %self.key, "Bearer token persisted");
        Ok(())
    }
}

/// Keeps every persisted token in memory
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tokens: RwLock<Vec<String>>,
    fail: AtomicBool,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Tokens persisted so far, oldest first
    pub async fn tokens(&self) -> Vec<String> {
        self.tokens.read().await.clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn persist_token(&self, token: &str) -> PersistenceResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write {
                path: "<memory>".to_string(),
                message: "credential store unavailable".to_string(),
            });
        }
        self.tokens.write().await.push(token.to_string());
        Ok(())
    }
}
