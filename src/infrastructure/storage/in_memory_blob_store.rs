use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::io::Cursor;

use crate::application::ports::{BlobReader, BlobStore, StorageError};
use crate::domain::value_objects::StorageKey;

/// Blob store held in process memory
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: DashMap<String, Bytes>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob under a raw key, bypassing key validation
    pub fn insert_raw(&self, key: impl Into<String>, body: Bytes) {
        self.blobs.insert(key.into(), body);
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.blobs.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &StorageKey, body: Bytes) -> Result<u64, StorageError> {
        let size = body.len() as u64;
        self.blobs.insert(key.as_str().to_string(), body);
        Ok(size)
    }

    async fn read(&self, key: &StorageKey) -> Result<BlobReader, StorageError> {
        let body = self
            .get(key.as_str())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::pin(Cursor::new(body)))
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.blobs.remove(key.as_str());
        Ok(())
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        Ok(self.blobs.contains_key(key.as_str()))
    }
}
