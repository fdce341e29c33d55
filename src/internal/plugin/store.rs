//! Plugin storage: one opaque blob per key on disk.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the plugin blob store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Keys become file names, so only `[A-Za-z0-9_]` is allowed.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persists plugin blobs as `{data_dir}/{key}.dat`.
///
/// The store never looks inside a blob; each plugin picks its own encoding.
#[derive(Debug, Clone)]
pub struct PluginStore {
    data_dir: PathBuf,
}

impl PluginStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write `bytes` under `key`, replacing any previous blob.
    pub fn write_blob(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(key)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "blob written");
        Ok(())
    }

    /// Read the blob under `key`; `None` if nothing was ever saved there.
    pub fn read_blob(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.blob_path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn blob_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.data_dir.join(format!("{key}.dat")))
    }
}
