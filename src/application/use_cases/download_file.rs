use std::sync::Arc;
use tracing::{info, warn};

use crate::application::errors::DownloadError;
use crate::application::ports::{
    BlobReader, BlobStore, FileRepository, RepositoryError, StorageError,
};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileId;

/// Use case: Stream the content of an active file.
///
/// Records that are expiring or gone are reported as `NotFound`, the same
/// as ids that never existed.
pub struct DownloadFileUseCase {
    file_repo: Arc<dyn FileRepository>,
    blob_store: Arc<dyn BlobStore>,
    timeouts: StoreTimeouts,
}

impl DownloadFileUseCase {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        timeouts: StoreTimeouts,
    ) -> Self {
        Self {
            file_repo,
            blob_store,
            timeouts,
        }
    }

    pub async fn execute(&self, id: FileId) -> Result<(FileRecord, BlobReader), DownloadError> {
        let record = bounded(
            self.timeouts.metadata,
            self.file_repo.find_by_id(id),
            RepositoryError::Timeout,
        )
        .await?
        .filter(FileRecord::is_active)
        .ok_or(DownloadError::NotFound(id))?;

        let key = record.parsed_storage_key().map_err(|e| {
            warn!(file_id = %id, error = %e, "Active file has a malformed storage key");
            DownloadError::NotReadable(id)
        })?;

        // The blob can vanish between the lookup and the read when an
        // expiration pass claims the record in between.
        let reader = bounded(
            self.timeouts.blob,
            self.blob_store.read(&key),
            StorageError::Timeout,
        )
        .await
        .map_err(|e| match e {
            StorageError::NotFound(_) => DownloadError::NotFound(id),
            other => DownloadError::Storage(other),
        })?;

        info!(file_id = %id, storage_key = %key, "File download started");

        Ok((record, reader))
    }
}
