use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use super::storage::KeyValueStore;

const VALUE_EXTENSION: &str = "json";

/// File-based key/value storage
/// One file per key; writes land in a temporary sibling and are renamed into place
#[derive(Debug)]
pub struct FileStore {
    /// Directory holding one file per key
    storage_dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `storage_dir`
    pub async fn open(storage_dir: impl AsRef<Path>) -> AppResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();

        tokio::fs::create_dir_all(&storage_dir).await.map_err(|e| {
            AppError::StorageError(format!(
                "Failed to create storage directory {}: {}",
                storage_dir.display(),
                e
            ))
        })?;

        info!("File storage initialized at: {}", storage_dir.display());
        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::StorageError(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.storage_dir.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        let tmp_path = self
            .storage_dir
            .join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp_path, value).await.map_err(|e| {
            AppError::StorageError(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(|e| {
            AppError::StorageError(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.storage_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
