//! Error types returned by the file lifecycle use cases

use thiserror::Error;

use crate::application::ports::{RepositoryError, StorageError};
use crate::domain::value_objects::FileId;

/// Errors returned by the upload coordinator
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload exceeds the upload limit of {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("Failed to read upload payload: {0}")]
    PayloadReadFailed(#[source] std::io::Error),

    #[error("Blob write failed: {0}")]
    StorageWriteFailed(#[source] StorageError),

    #[error("Metadata write failed: {0}")]
    MetadataWriteFailed(#[source] RepositoryError),

    #[error("Metadata conflict: {0}")]
    MetadataConflict(String),
}

/// Errors returned by lookups and search
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    NotFound(FileId),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by rename
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    NotFound(FileId),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors returned by download
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("File not found: {0}")]
    NotFound(FileId),

    #[error("File {0} has an unreadable storage key")]
    NotReadable(FileId),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
