use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use crate::application::cache::CacheInvalidator;
use crate::application::dto::UploadRequest;
use crate::application::errors::UploadError;
use crate::application::ports::{
    BlobReader, BlobStore, Clock, FileRepository, RepositoryError, StorageError, UploadCompleted,
    UploadEventPublisher,
};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::application::validation::validate_upload_request;
use crate::domain::entities::{FileRecord, NewFileRecord};
use crate::domain::value_objects::StorageKey;

/// Upload limits and URL settings
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Largest accepted payload; a payload of exactly this size is accepted
    pub max_payload_bytes: u64,
    pub public_base_url: String,
    pub timeouts: StoreTimeouts,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 10 * 1024 * 1024,
            public_base_url: "http://localhost:8080/files".to_string(),
            timeouts: StoreTimeouts::default(),
        }
    }
}

/// Use case: Upload a file.
///
/// The blob is written before the metadata row, so a committed row always
/// points at a stored blob. If the row cannot be written the blob is removed
/// again; if that also fails the orphan is logged and left behind.
pub struct UploadFileUseCase {
    file_repo: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
    invalidator: CacheInvalidator,
    events: Arc<dyn UploadEventPublisher>,
    clock: Arc<dyn Clock>,
    settings: UploadSettings,
}

impl UploadFileUseCase {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        invalidator: CacheInvalidator,
        events: Arc<dyn UploadEventPublisher>,
        clock: Arc<dyn Clock>,
        settings: UploadSettings,
    ) -> Self {
        Self {
            file_repo,
            blob_store,
            invalidator,
            events,
            clock,
            settings,
        }
    }

    /// Execute upload workflow
    pub async fn execute(
        &self,
        request: UploadRequest,
        reader: BlobReader,
    ) -> Result<FileRecord, UploadError> {
        // 1. Parse and validate request
        let (owner_id, display_name) = validate_upload_request(&request)?;

        // 2. Read the payload, never buffering more than limit + 1 bytes
        let body = read_payload(reader, self.settings.max_payload_bytes).await?;
        let size_bytes = body.len();

        // 3. Fresh storage key for every upload, even for repeated names
        let storage_key = StorageKey::generate(&display_name);

        // 4. Write blob
        let started = Instant::now();
        bounded(
            self.settings.timeouts.blob,
            self.blob_store.put(&storage_key, body),
            StorageError::Timeout,
        )
        .await
        .map_err(|e| {
            error!(
                storage_key = %storage_key,
                owner_id = %owner_id,
                error = %e,
                "Blob write failed"
            );
            UploadError::StorageWriteFailed(e)
        })?;

        // 5. Commit metadata row
        let new_record = NewFileRecord::new(
            owner_id,
            display_name,
            storage_key.clone(),
            &self.settings.public_base_url,
            self.clock.now(),
        );

        let record = match bounded(
            self.settings.timeouts.metadata,
            self.file_repo.insert(new_record),
            RepositoryError::Timeout,
        )
        .await
        {
            Ok(record) => record,
            Err(e) => {
                error!(storage_key = %storage_key, error = %e, "Metadata write failed");
                self.remove_orphan(&storage_key).await;
                return Err(match e {
                    RepositoryError::Conflict(msg) => UploadError::MetadataConflict(msg),
                    other => UploadError::MetadataWriteFailed(other),
                });
            }
        };

        // 6. Stale listings and search results must not outlive the commit
        self.invalidator
            .invalidate_owner_listing(record.owner_id())
            .await;
        self.invalidator.invalidate_search_results().await;

        // 7. Notify listeners; delivery failures never fail the upload
        self.events.publish(UploadCompleted::from(&record));

        info!(
            file_id = %record.id(),
            owner_id = %record.owner_id(),
            storage_key = %record.storage_key(),
            size_bytes,
            duration_ms = started.elapsed().as_millis() as u64,
            "File uploaded"
        );

        Ok(record)
    }

    async fn remove_orphan(&self, storage_key: &StorageKey) {
        let result = bounded(
            self.settings.timeouts.blob,
            self.blob_store.delete(storage_key),
            StorageError::Timeout,
        )
        .await;

        match result {
            Ok(()) => info!(storage_key = %storage_key, "Removed blob after failed metadata write"),
            Err(e) => error!(
                storage_key = %storage_key,
                error = %e,
                "Failed to remove blob after failed metadata write; blob is orphaned"
            ),
        }
    }
}

async fn read_payload(reader: BlobReader, limit: u64) -> Result<Bytes, UploadError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .await
        .map_err(UploadError::PayloadReadFailed)?;

    if buf.len() as u64 > limit {
        return Err(UploadError::PayloadTooLarge { limit });
    }

    Ok(Bytes::from(buf))
}
