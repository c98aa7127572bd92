use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;

use crate::domain::{
    entities::FileRecord,
    value_objects::{FileId, FileState},
};

/// Serialized view of a file record; this is what the cache stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDto {
    pub id: FileId,
    pub owner_id: String,
    pub display_name: String,
    pub storage_key: String,
    pub public_url: String,
    pub state: FileState,
    pub created_at: String,
}

impl From<&FileRecord> for FileDto {
    fn from(record: &FileRecord) -> Self {
        Self {
            id: record.id(),
            owner_id: record.owner_id().to_string(),
            display_name: record.display_name().to_string(),
            storage_key: record.storage_key().to_string(),
            public_url: record.public_url().to_string(),
            state: record.state(),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

impl From<FileRecord> for FileDto {
    fn from(record: FileRecord) -> Self {
        Self::from(&record)
    }
}

/// DTO for upload request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub owner_id: String,
    pub display_name: String,
}

/// JSON payload as it was written to (or read from) the cache.
///
/// Lookups hand back the exact bytes that were cached instead of
/// re-serializing, so a hit costs no decoding unless the caller asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedJson<T> {
    raw: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CachedJson<T> {
    pub fn from_raw(raw: String) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl<T: DeserializeOwned> CachedJson<T> {
    pub fn decode(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.raw)
    }
}
