use async_trait::async_trait;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Port for the key/value cache in front of the metadata store.
///
/// All operations are idempotent and safe under concurrent callers. Callers
/// treat every error as a cache miss.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every entry whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}
