//! Snapshot Store
//!
//! Keeps the full id -> record mapping as one JSON file. The file's
//! modification time doubles as the freshness signal after a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use presence_core::Snapshot;

use super::write_atomic;
use crate::error::{PersistenceError, PersistenceResult};

/// Durable home of the snapshot
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot; a missing or blank store reads as empty
    async fn read(&self) -> PersistenceResult<Snapshot>;

    /// Replace the stored snapshot
    async fn write(&self, snapshot: &Snapshot) -> PersistenceResult<()>;

    /// When the store was last written, if it exists
    async fn last_modified(&self) -> PersistenceResult<Option<DateTime<Utc>>>;
}

/// Snapshot stored as pretty-printed JSON on the local filesystem
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn read(&self) -> PersistenceResult<Snapshot> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.display_path(), "Snapshot file not found, starting empty");
                return Ok(Snapshot::new());
            }
            Err(e) => {
                return Err(PersistenceError::Read {
                    path: self.display_path(),
                    message: e.to_string(),
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Snapshot::new());
        }

        serde_json::from_str(&raw).map_err(|e| PersistenceError::Parse {
            path: self.display_path(),
            message: e.to_string(),
        })
    }

    async fn write(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| PersistenceError::Write {
            path: self.display_path(),
            message: format!("failed to serialize snapshot: {}", e),
        })?;

        write_atomic(&self.path, &json).await?;
        debug!(path = %self.display_path(), records = snapshot.len(), "Snapshot written");
        Ok(())
    }

    async fn last_modified(&self) -> PersistenceResult<Option<DateTime<Utc>>> {
        match fs::metadata(&self.path).await {
            Ok(meta) => {
                let modified = meta.modified().map_err(|e| PersistenceError::Read {
                    path: self.display_path(),
                    message: e.to_string(),
                })?;
                Ok(Some(DateTime::<Utc>::from(modified)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::Read {
                path: self.display_path(),
                message: e.to_string(),
            }),
        }
    }
}

/// Snapshot kept in memory; the write time stands in for a file mtime
#[derive(Default)]
pub struct InMemorySnapshotStore {
    state: RwLock<Option<(Snapshot, DateTime<Utc>)>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn read(&self) -> PersistenceResult<Snapshot> {
        Ok(self
            .state
            .read()
            .await
            .as_ref()
            .map(|(snapshot, _)| snapshot.clone())
            .unwrap_or_default())
    }

    async fn write(&self, snapshot: &Snapshot) -> PersistenceResult<()> {
        *self.state.write().await = Some((snapshot.clone(), Utc::now()));
        Ok(())
    }

    async fn last_modified(&self) -> PersistenceResult<Option<DateTime<Utc>>> {
        Ok(self.state.read().await.as_ref().map(|(_, at)| *at))
    }
}
