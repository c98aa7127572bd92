use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::cache::{self, CachePolicy};
use crate::application::dto::{CachedJson, FileDto};
use crate::application::errors::LookupError;
use crate::application::ports::{CacheError, CacheStore, FileRepository, RepositoryError};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::application::validation::{normalize_search_query, validate_owner};
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileId;

/// Read-through lookups over the metadata store.
///
/// A cache hit returns the cached JSON untouched. A miss (or any cache
/// failure) falls back to the metadata store, and the fresh result is written
/// back on a best-effort basis. Only active records are ever returned.
pub struct FileLookupService {
    file_repo: Arc<dyn FileRepository>,
    cache: Arc<dyn CacheStore>,
    policy: CachePolicy,
    timeouts: StoreTimeouts,
}

impl FileLookupService {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        cache: Arc<dyn CacheStore>,
        policy: CachePolicy,
        timeouts: StoreTimeouts,
    ) -> Self {
        Self {
            file_repo,
            cache,
            policy,
            timeouts,
        }
    }

    /// One active record by ID
    pub async fn get_by_id(&self, id: FileId) -> Result<CachedJson<FileDto>, LookupError> {
        self.read_through(&cache::file_key(id), self.policy.record_ttl, || async {
            let record = self.find_active(id).await?;
            Ok::<_, LookupError>(FileDto::from(&record))
        })
        .await
    }

    /// Active records of one owner, newest first
    pub async fn list_by_owner(
        &self,
        owner_id: &str,
    ) -> Result<CachedJson<Vec<FileDto>>, LookupError> {
        let owner_id = validate_owner(owner_id)?;

        self.read_through(
            &cache::owner_listing_key(&owner_id),
            self.policy.listing_ttl,
            || async {
                let records = self
                    .metadata(self.file_repo.list_by_owner(&owner_id))
                    .await?;
                Ok::<_, LookupError>(to_dtos(&records))
            },
        )
        .await
    }

    /// Active records whose display name or public URL contains `query`,
    /// case-insensitively, newest first
    pub async fn search(&self, query: &str) -> Result<CachedJson<Vec<FileDto>>, LookupError> {
        let normalized = normalize_search_query(query)?;

        self.read_through(
            &cache::search_key(&normalized),
            self.policy.search_ttl,
            || async {
                let records = self.metadata(self.file_repo.search(&normalized)).await?;
                Ok::<_, LookupError>(to_dtos(&records))
            },
        )
        .await
    }

    /// Public URL of an active record, served through the record cache
    pub async fn shareable_url(&self, id: FileId) -> Result<String, LookupError> {
        let dto = self.get_by_id(id).await?.decode()?;
        Ok(dto.public_url)
    }

    async fn find_active(&self, id: FileId) -> Result<FileRecord, LookupError> {
        self.metadata(self.file_repo.find_by_id(id))
            .await?
            .filter(FileRecord::is_active)
            .ok_or(LookupError::NotFound(id))
    }

    async fn metadata<T>(
        &self,
        fut: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, LookupError> {
        bounded(self.timeouts.metadata, fut, RepositoryError::Timeout)
            .await
            .map_err(LookupError::from)
    }

    async fn read_through<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        load: F,
    ) -> Result<CachedJson<T>, LookupError>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, LookupError>>,
    {
        match bounded(self.timeouts.cache, self.cache.get(key), CacheError::Timeout).await {
            Ok(Some(raw)) => {
                debug!(cache_key = %key, "Cache hit");
                return Ok(CachedJson::from_raw(raw));
            }
            Ok(None) => debug!(cache_key = %key, "Cache miss"),
            Err(e) => warn!(cache_key = %key, error = %e, "Cache read failed, using metadata store"),
        }

        let value = load().await?;
        let raw = serde_json::to_string(&value)?;

        if let Err(e) = bounded(
            self.timeouts.cache,
            self.cache.set(key, raw.clone(), ttl),
            CacheError::Timeout,
        )
        .await
        {
            warn!(cache_key = %key, error = %e, "Cache write failed");
        }

        Ok(CachedJson::from_raw(raw))
    }
}

fn to_dtos(records: &[FileRecord]) -> Vec<FileDto> {
    records.iter().map(FileDto::from).collect()
}
