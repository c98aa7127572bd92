use std::sync::Arc;
use tracing::info;

use crate::application::cache::CacheInvalidator;
use crate::application::errors::RenameError;
use crate::application::ports::{FileRepository, RepositoryError};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{DisplayName, FileId};

/// Use case: Rename an active file.
///
/// Only the display name changes; the storage key and public URL stay put.
pub struct RenameFileUseCase {
    file_repo: Arc<dyn FileRepository>,
    invalidator: CacheInvalidator,
    timeouts: StoreTimeouts,
}

impl RenameFileUseCase {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        invalidator: CacheInvalidator,
        timeouts: StoreTimeouts,
    ) -> Self {
        Self {
            file_repo,
            invalidator,
            timeouts,
        }
    }

    pub async fn execute(&self, id: FileId, new_name: &str) -> Result<FileRecord, RenameError> {
        let display_name =
            DisplayName::new(new_name).map_err(|e| RenameError::InvalidRequest(e.to_string()))?;

        let mut record = bounded(
            self.timeouts.metadata,
            self.file_repo.find_by_id(id),
            RepositoryError::Timeout,
        )
        .await?
        .filter(FileRecord::is_active)
        .ok_or(RenameError::NotFound(id))?;

        // The store re-checks the state, so a record that started expiring
        // since the read above is not renamed.
        bounded(
            self.timeouts.metadata,
            self.file_repo.rename(id, &display_name),
            RepositoryError::Timeout,
        )
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound(_) => RenameError::NotFound(id),
            other => RenameError::Repository(other),
        })?;

        let previous = record.display_name().to_string();
        record
            .rename(display_name)
            .map_err(|e| RenameError::InvalidRequest(e.to_string()))?;

        self.invalidator.invalidate_record(&record).await;

        info!(
            file_id = %id,
            from = %previous,
            to = %record.display_name(),
            "File renamed"
        );

        Ok(record)
    }
}
