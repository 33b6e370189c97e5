//! Durable state
//!
//! Two files survive restarts: the snapshot blob and the credential file
//! holding the bearer token. Both are replaced atomically (write to a
//! sibling temp file, fsync, rename).

mod credentials;
mod snapshot;

pub use credentials::{CredentialStore, EnvFileCredentialStore, InMemoryCredentialStore};
pub use snapshot::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore};

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{PersistenceError, PersistenceResult};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `data` without ever exposing a partial file
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> PersistenceResult<()> {
    let write_error = |message: String| PersistenceError::Write {
        path: path.display().to_string(),
        message,
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| write_error("path has no file name".to_string()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.tmp.{}.{}",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));

    let result = async {
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| write_error(format!("failed to create directory: {}", e)))?;

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(|e| write_error(format!("failed to create temp file: {}", e)))?;
        file.write_all(data)
            .await
            .map_err(|e| write_error(format!("failed to write temp file: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| write_error(format!("failed to sync temp file: {}", e)))?;
        drop(file);

        fs::rename(&tmp_path, path)
            .await
            .map_err(|e| write_error(format!("failed to rename temp file: {}", e)))
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    result
}
