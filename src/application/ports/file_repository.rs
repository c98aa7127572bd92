use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

use crate::domain::entities::{FileRecord, NewFileRecord};
use crate::domain::value_objects::{DisplayName, FileId, FileState, OwnerId};
#[cfg(test)]
use mockall::{automock, predicate::*};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Metadata operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Position in an oldest-first expiration scan: the `(created_at, id)` of
/// the last row read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    pub created_at: DateTime<Utc>,
    pub id: FileId,
}

/// One page of an expiration scan.
///
/// `next` is taken from the last row read, including rows that could not be
/// mapped to a record, so unreadable rows never pin the scan in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub records: Vec<FileRecord>,
    /// Where the following page starts; `None` once the scan is exhausted
    pub next: Option<ScanCursor>,
}

/// Port for file metadata persistence.
///
/// The repository is the single source of truth for file records; every
/// method runs in its own transaction.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a new active record, assigning its ID.
    /// Fails with `Conflict` if the storage key is already taken.
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, RepositoryError>;

    /// Find a record by ID, in any state
    async fn find_by_id(&self, id: FileId) -> Result<Option<FileRecord>, RepositoryError>;

    /// Active records of one owner, newest first
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<FileRecord>, RepositoryError>;

    /// Active records whose display name or public URL contains `pattern`
    /// (case-insensitive, matched literally), newest first
    async fn search(&self, pattern: &str) -> Result<Vec<FileRecord>, RepositoryError>;

    /// Set the state of a record. Fails with `NotFound` if the row is gone.
    async fn update_state(&self, id: FileId, state: FileState) -> Result<(), RepositoryError>;

    /// Rename an active record. Fails with `NotFound` if no active row matches.
    async fn rename(&self, id: FileId, display_name: &DisplayName) -> Result<(), RepositoryError>;

    /// Remove the row. Removing an absent row succeeds.
    async fn delete(&self, id: FileId) -> Result<(), RepositoryError>;

    /// Records in `state` created strictly before `threshold`, oldest first,
    /// starting after `after` and reading at most `limit` rows
    async fn find_older_than(
        &self,
        state: FileState,
        threshold: DateTime<Utc>,
        after: Option<ScanCursor>,
        limit: i64,
    ) -> Result<ScanPage, RepositoryError>;
}
