//! Cache key layout, TTL policy and invalidation.
//!
//! Keys:
//! - `file_metadata:{id}` - one serialized file record
//! - `user:files:{owner_id}` - an owner's listing
//! - `search:{normalized query}` - a search result set
//!
//! Invalidation is best effort: a failed delete is logged and the entry ages
//! out with its TTL.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::ports::{CacheError, CacheStore};
use crate::application::timeouts::bounded;
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{FileId, OwnerId};

pub const SEARCH_PREFIX: &str = "search:";

pub fn file_key(id: FileId) -> String {
    format!("file_metadata:{}", id)
}

pub fn owner_listing_key(owner_id: &OwnerId) -> String {
    format!("user:files:{}", owner_id)
}

/// Search key for an already normalized query
pub fn search_key(normalized_query: &str) -> String {
    format!("{}{}", SEARCH_PREFIX, normalized_query)
}

/// Time-to-live for each kind of cached payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub record_ttl: Duration,
    pub listing_ttl: Duration,
    pub search_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            record_ttl: Duration::from_secs(300),
            listing_ttl: Duration::from_secs(300),
            search_ttl: Duration::from_secs(600),
        }
    }
}

/// Removes cached views after a state-changing operation
#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn CacheStore>,
    timeout: Duration,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn CacheStore>, timeout: Duration) -> Self {
        Self { cache, timeout }
    }

    pub async fn invalidate_file(&self, id: FileId) {
        self.delete_key(&file_key(id)).await;
    }

    pub async fn invalidate_owner_listing(&self, owner_id: &OwnerId) {
        self.delete_key(&owner_listing_key(owner_id)).await;
    }

    /// Drop every cached search result; cheaper than tracking which queries
    /// a record matched.
    pub async fn invalidate_search_results(&self) {
        let result = bounded(
            self.timeout,
            self.cache.delete_prefix(SEARCH_PREFIX),
            CacheError::Timeout,
        )
        .await;

        if let Err(e) = result {
            warn!(error = %e, prefix = SEARCH_PREFIX, "Cache prefix invalidation failed");
        }
    }

    /// Everything that may describe `record`: its own entry, its owner's
    /// listing and all search results
    pub async fn invalidate_record(&self, record: &FileRecord) {
        self.invalidate_file(record.id()).await;
        self.invalidate_owner_listing(record.owner_id()).await;
        self.invalidate_search_results().await;
    }

    async fn delete_key(&self, key: &str) {
        match bounded(self.timeout, self.cache.delete(key), CacheError::Timeout).await {
            Ok(()) => debug!(cache_key = %key, "Cache entry invalidated"),
            Err(e) => warn!(error = %e, cache_key = %key, "Cache invalidation failed"),
        }
    }
}
