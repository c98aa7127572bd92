//! Shared test fixtures and utilities for all test types
//!
//! Wires the full file lifecycle over in-process adapters with a manual
//! clock, plus wrappers that inject blob store and metadata failures.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::Semaphore;

use filekeeper::application::builder::{ApplicationBuilder, FileLifecycle};
use filekeeper::application::dto::{FileDto, UploadRequest};
use filekeeper::application::errors::{DownloadError, UploadError};
use filekeeper::application::ports::{
    BlobReader, BlobStore, FileRepository, RepositoryError, ScanCursor, ScanPage, StorageError,
};
use filekeeper::domain::entities::{FileRecord, NewFileRecord};
use filekeeper::domain::value_objects::{DisplayName, FileId, FileState, OwnerId, StorageKey};
use filekeeper::infrastructure::{
    cache::InMemoryCache, clock::ManualClock, persistence::InMemoryFileRepository,
    storage::InMemoryBlobStore,
};
use filekeeper::Config;

pub const RETENTION: Duration = Duration::from_secs(3600);
pub const UPLOAD_LIMIT: u64 = 1024;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Test environment container with all necessary components
pub struct TestEnvironment {
    pub app: FileLifecycle,
    pub file_repo: Arc<FlakyFileRepository>,
    pub blob_store: Arc<FlakyBlobStore>,
    pub cache: Arc<InMemoryCache>,
    pub clock: Arc<ManualClock>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let file_repo = Arc::new(FlakyFileRepository::new());
        let blob_store = Arc::new(FlakyBlobStore::new());
        let cache = Arc::new(InMemoryCache::with_clock(clock.clone()));

        let app = ApplicationBuilder::new(config)
            .with_file_repository(file_repo.clone())
            .with_blob_store(blob_store.clone())
            .with_cache(cache.clone())
            .with_clock(clock.clone())
            .build()
            .expect("Failed to build application");

        Self {
            app,
            file_repo,
            blob_store,
            cache,
            clock,
        }
    }

    pub async fn upload(
        &self,
        owner_id: &str,
        display_name: &str,
        body: &[u8],
    ) -> Result<FileRecord, UploadError> {
        self.app
            .upload
            .execute(
                UploadRequest {
                    owner_id: owner_id.to_string(),
                    display_name: display_name.to_string(),
                },
                reader(body),
            )
            .await
    }

    pub async fn get(&self, id: FileId) -> Option<FileDto> {
        self.app
            .lookup
            .get_by_id(id)
            .await
            .ok()
            .map(|cached| cached.decode().expect("Cached record is not valid JSON"))
    }

    /// Full content of an active file
    pub async fn download(&self, id: FileId) -> Result<Vec<u8>, DownloadError> {
        let (_, mut reader) = self.app.download.execute(id).await?;
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .await
            .map_err(StorageError::Io)?;
        Ok(body)
    }

    pub async fn listing(&self, owner_id: &str) -> Vec<FileDto> {
        self.app
            .lookup
            .list_by_owner(owner_id)
            .await
            .expect("Listing failed")
            .decode()
            .expect("Cached listing is not valid JSON")
    }

    pub async fn search(&self, query: &str) -> Vec<FileDto> {
        self.app
            .lookup
            .search(query)
            .await
            .expect("Search failed")
            .decode()
            .expect("Cached search is not valid JSON")
    }

    /// Move the clock past the retention window of everything uploaded so far
    pub fn expire_everything(&self) {
        self.clock.advance(RETENTION + Duration::from_secs(1));
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.max_upload_bytes = UPLOAD_LIMIT;
    config.retention_secs = RETENTION.as_secs();
    config.sweep_batch_size = 100;
    config.sweep_concurrency = 4;
    config.public_base_url = Some("https://files.test".to_string());
    config
}

pub fn reader(body: &[u8]) -> BlobReader {
    Box::pin(Cursor::new(body.to_vec()))
}

/// Active record with an arbitrary, possibly malformed, storage key
pub fn legacy_record(id: i64, owner: &str, storage_key: &str, created_at: DateTime<Utc>) -> FileRecord {
    FileRecord::reconstruct(
        FileId::new(id),
        OwnerId::new(owner).unwrap(),
        DisplayName::new("legacy.bin").unwrap(),
        storage_key.to_string(),
        format!("https://files.test/{}", storage_key),
        created_at,
        FileState::Active,
    )
}

/// In-memory blob store whose writes and deletes can be made to fail or block
pub struct FlakyBlobStore {
    pub inner: InMemoryBlobStore,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    delete_gate: parking_lot::Mutex<Option<Arc<Semaphore>>>,
    pub delete_calls: AtomicUsize,
}

impl FlakyBlobStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryBlobStore::new(),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            delete_gate: parking_lot::Mutex::new(None),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Block every delete until permits are added to the returned gate
    pub fn hold_deletes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.delete_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn put(&self, key: &StorageKey, body: Bytes) -> Result<u64, StorageError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected put failure".to_string()));
        }
        self.inner.put(key, body).await
    }

    async fn read(&self, key: &StorageKey) -> Result<BlobReader, StorageError> {
        self.inner.read(key).await
    }

    async fn delete(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.delete_gate.lock().clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected delete failure".to_string()));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool, StorageError> {
        self.inner.exists(key).await
    }
}

/// In-memory metadata store whose inserts can be made to fail
pub struct FlakyFileRepository {
    pub inner: InMemoryFileRepository,
    fail_inserts: AtomicBool,
}

impl FlakyFileRepository {
    pub fn new() -> Self {
        Self {
            inner: InMemoryFileRepository::new(),
            fail_inserts: AtomicBool::new(false),
        }
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn row(&self, id: FileId) -> Option<FileRecord> {
        self.inner.get(id)
    }
}

#[async_trait]
impl FileRepository for FlakyFileRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, RepositoryError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Internal("injected insert failure".to_string()));
        }
        self.inner.insert(record).await
    }

    async fn find_by_id(&self, id: FileId) -> Result<Option<FileRecord>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<FileRecord>, RepositoryError> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn search(&self, pattern: &str) -> Result<Vec<FileRecord>, RepositoryError> {
        self.inner.search(pattern).await
    }

    async fn update_state(&self, id: FileId, state: FileState) -> Result<(), RepositoryError> {
        self.inner.update_state(id, state).await
    }

    async fn rename(&self, id: FileId, display_name: &DisplayName) -> Result<(), RepositoryError> {
        self.inner.rename(id, display_name).await
    }

    async fn delete(&self, id: FileId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }

    async fn find_older_than(
        &self,
        state: FileState,
        threshold: DateTime<Utc>,
        after: Option<ScanCursor>,
        limit: i64,
    ) -> Result<ScanPage, RepositoryError> {
        self.inner.find_older_than(state, threshold, after, limit).await
    }
}
