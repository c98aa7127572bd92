use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{BlobReader, BlobStore, StorageError};
use crate::domain::value_objects::StorageKey;

const TEMP_DIR: &str = ".tmp";

/// Local filesystem blob store.
///
/// Blobs live at `{root}/{storage key}`. Writes land in `{root}/.tmp` first
/// and are renamed into place, so a reader never sees a partial blob.
pub struct LocalFilesystemStore {
    root: PathBuf,
    durable_writes: bool,
}

impl LocalFilesystemStore {
    pub fn new(root: PathBuf) -> Self {
        Self::with_durability(root, true)
    }

    pub fn with_durability(root: PathBuf, durable_writes: bool) -> Self {
        Self {
            root,
            durable_writes,
        }
    }

    /// Initialize storage directories
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.root.join(TEMP_DIR)).await?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Final location of a blob; keys that would escape the root are rejected
    pub fn path_for(&self, key: &StorageKey) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.as_str());
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn write_temp(&self, temp_path: &Path, body: &[u8]) -> Result<(), StorageError> {
        let mut file = File::create(temp_path).await?;
        file.write_all(body).await?;
        file.flush().await?;
        if self.durable_writes {
            file.sync_all().await?;
        }
        Ok(())
    }

    async fn sync_dir(&self, dir: &Path) {
        match File::open(dir).await {
            Ok(handle) => {
                if let Err(e) = handle.sync_all().await {
                    // Already renamed - log but don't fail
                    warn!(dir = ?dir, error = %e, "Failed to sync directory after rename");
                }
            }
            Err(e) => warn!(dir = ?dir, error = %e, "Failed to open directory for sync"),
        }
    }
}

#[async_trait]
impl BlobStore for LocalFilesystemStore {
    async fn put(&self, key: &StorageKey, body: Bytes) -> Result<u64, StorageError> {
        let final_path = self.path_for(key)?;
        let temp_path = self.root.join(TEMP_DIR).join(Uuid::new_v4().to_string());

        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        debug!(storage_key = %key, temp_path = ?temp_path, "Writing blob to temp file");
        if let Err(e) = self.write_temp(&temp_path, &body).await {
            warn!(temp_path = ?temp_path, error = %e, "Failed to write blob to temp file");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        if let Some(parent) = final_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::Io(e));
            }
        }

        // Atomic rename; a blob already at this key is replaced
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StorageError::Io(e));
        }

        if self.durable_writes {
            if let Some(parent) = final_path.parent() {
                self.sync_dir(parent).await;
            }
        }

        Ok(body.len() as u64)
    }

    async fn read(&self, key: &StorageKey) -> Result<BlobReader, StorageError> {
        let file = File::open(self.path_for(key)?).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        Ok(Box::pin(BufReader::new(file)))
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(storage_key = %key, "Blob already absent");
                Ok(())
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        match fs::metadata(self.path_for(key)?).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
