use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::application::cache::CacheInvalidator;
use crate::application::ports::{BlobStore, FileRepository, RepositoryError, StorageError};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileState;

/// What happened to one expired record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpirationOutcome {
    /// Blob and row are gone
    Deleted,
    /// The row was already removed by someone else
    AlreadyGone,
    /// The storage key does not parse; the record was left untouched
    SkippedMalformedKey(String),
    /// The row stays in `deleting` and is retried on the next sweep
    BlobDeleteFailed(String),
    MetadataFailed(String),
}

/// Expires a single record: mark it `deleting`, delete the blob, delete the
/// row. Every step tolerates the previous attempt having got further, so
/// running it twice for the same record is harmless.
#[derive(Clone)]
pub struct RecordExpirer {
    file_repo: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
    invalidator: CacheInvalidator,
    timeouts: StoreTimeouts,
}

impl RecordExpirer {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        invalidator: CacheInvalidator,
        timeouts: StoreTimeouts,
    ) -> Self {
        Self {
            file_repo,
            blob_store,
            invalidator,
            timeouts,
        }
    }

    pub async fn expire(&self, record: &FileRecord) -> ExpirationOutcome {
        let id = record.id();

        let storage_key = match record.parsed_storage_key() {
            Ok(key) => key,
            Err(e) => {
                warn!(
                    file_id = %id,
                    storage_key = %record.storage_key(),
                    error = %e,
                    "Skipping expired record with malformed storage key"
                );
                return ExpirationOutcome::SkippedMalformedKey(record.storage_key().to_string());
            }
        };

        // Work on a snapshot; the entity decides which transitions are legal
        let mut record = record.clone();
        let previous = record.state();
        if let Err(e) = record.mark_deleting() {
            debug!(file_id = %id, error = %e, "Expired record already deleted");
            return ExpirationOutcome::AlreadyGone;
        }

        if previous == FileState::Active {
            match bounded(
                self.timeouts.metadata,
                self.file_repo.update_state(id, record.state()),
                RepositoryError::Timeout,
            )
            .await
            {
                Ok(()) => {}
                Err(RepositoryError::NotFound(_)) => {
                    debug!(file_id = %id, "Expired record already removed");
                    self.invalidator.invalidate_record(&record).await;
                    return ExpirationOutcome::AlreadyGone;
                }
                Err(e) => {
                    error!(file_id = %id, error = %e, "Failed to mark record as deleting");
                    return ExpirationOutcome::MetadataFailed(e.to_string());
                }
            }

            // Readers must stop seeing the record before its blob goes
            self.invalidator.invalidate_record(&record).await;
        }

        if let Err(e) = bounded(
            self.timeouts.blob,
            self.blob_store.delete(&storage_key),
            StorageError::Timeout,
        )
        .await
        {
            error!(
                file_id = %id,
                storage_key = %storage_key,
                error = %e,
                "Blob delete failed; record stays in deleting"
            );
            return ExpirationOutcome::BlobDeleteFailed(e.to_string());
        }

        if let Err(e) = bounded(
            self.timeouts.metadata,
            self.file_repo.delete(id),
            RepositoryError::Timeout,
        )
        .await
        {
            error!(file_id = %id, error = %e, "Row delete failed after blob removal");
            return ExpirationOutcome::MetadataFailed(e.to_string());
        }

        self.invalidator.invalidate_record(&record).await;

        match record.mark_deleted() {
            Ok(()) => {
                debug!(file_id = %id, storage_key = %storage_key, "Expired record deleted");
                ExpirationOutcome::Deleted
            }
            Err(e) => ExpirationOutcome::MetadataFailed(e.to_string()),
        }
    }
}
