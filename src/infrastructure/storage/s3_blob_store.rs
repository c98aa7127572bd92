use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::{Error as ObjectStoreError, ObjectStoreExt};
use std::io::Cursor;
use std::time::Instant;

use crate::application::ports::{BlobReader, BlobStore, StorageError};
use crate::domain::value_objects::StorageKey;

/// S3 (or S3-compatible) blob store.
///
/// Credentials come from the standard `AWS_*` environment variables.
#[derive(Clone)]
pub struct S3BlobStore {
    store: AmazonS3,
    bucket: String,
}

impl S3BlobStore {
    /// `endpoint` points at an S3-compatible service such as MinIO; plain
    /// HTTP is allowed only when an endpoint is given.
    pub fn new(
        bucket: String,
        region: String,
        endpoint: Option<String>,
    ) -> Result<Self, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint).with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to build S3 object store: {}", e)))?;

        Ok(Self { store, bucket })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(key: &StorageKey) -> Path {
        Path::from(key.as_str())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &StorageKey, body: Bytes) -> Result<u64, StorageError> {
        let start = Instant::now();
        let size = body.len() as u64;

        match self.store.put(&Self::location(key), body.into()).await {
            Ok(_) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                Err(StorageError::Backend(e.to_string()))
            }
        }
    }

    async fn read(&self, key: &StorageKey) -> Result<BlobReader, StorageError> {
        let start = Instant::now();

        let fetched = match self.store.get(&Self::location(key)).await {
            Ok(result) => result.bytes().await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(body) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = body.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download successful"
                );
                Ok(Box::pin(Cursor::new(body)))
            }
            Err(ObjectStoreError::NotFound { .. }) => Err(StorageError::NotFound(key.to_string())),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                Err(StorageError::Backend(e.to_string()))
            }
        }
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        let start = Instant::now();

        match self.store.delete(&Self::location(key)).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete successful"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                Err(StorageError::Backend(e.to_string()))
            }
        }
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        match self.store.head(&Self::location(key)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::Backend(e.to_string())),
        }
    }
}
