//! Local filesystem snapshot store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::SnapshotStore;

/// Snapshot kept in a single text file.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    path: PathBuf,
}

impl LocalSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No snapshot at {}", self.path.display());
                Ok(String::new())
            }
            Err(e) => Err(AppError::persistence(&self.path, e)),
        }
    }

    async fn save(&self, snapshot: &str) -> Result<()> {
        self.write_bytes(snapshot.as_bytes())
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        log::debug!(
            "Snapshot written to {} ({} bytes)",
            self.path.display(),
            snapshot.len()
        );
        Ok(())
    }
}
