//! Key-value blob storage
//!
//! Stores one blob per string key as a file under the store root.
//! Every write replaces the whole blob atomically (temp file + rename), so a
//! reader never observes a half-written collection.
//!
//! Example: key "taskflow_tasks" is stored at "<root>/taskflow_tasks.json"

use crate::error::{AppError, Result};
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File-backed key-value blob store
#[derive(Clone, Debug)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a new blob store at the given root directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Initialize the blob store (create directory if needed)
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Replace the blob stored under `key`
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.get_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to temp file first (atomic write)
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        fs::rename(temp_path, &path).await?;

        tracing::debug!("Wrote blob: {} ({} bytes)", key, data.len());

        Ok(())
    }

    /// Read the blob stored under `key`, `None` if it was never written
    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.get_path(key)?;

        match fs::read(&path).await {
            Ok(data) => {
                tracing::debug!("Read blob: {} ({} bytes)", key, data.len());
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get file path for a key
    fn get_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(AppError::BlobStore(format!("Invalid blob key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

/// Keys map directly to file names, so only a conservative charset is allowed
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
