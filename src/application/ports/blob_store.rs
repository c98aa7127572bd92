use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::domain::value_objects::StorageKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Type alias for async reader
pub type BlobReader = Pin<Box<dyn AsyncRead + Send>>;

/// Port for physical blob storage operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write the blob under `key`, returning the number of bytes stored
    async fn put(&self, key: &StorageKey, body: Bytes) -> Result<u64, StorageError>;

    /// Open the blob under `key` for reading. Fails with `NotFound` if absent.
    async fn read(&self, key: &StorageKey) -> Result<BlobReader, StorageError>;

    /// Delete the blob under `key`. Deleting an absent blob succeeds.
    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError>;

    /// Check if blob exists
    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError>;
}
