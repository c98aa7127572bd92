use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::DomainError,
    value_objects::{DisplayName, FileId, FileState, OwnerId, StorageKey},
};

/// A file record before the metadata store has assigned it an ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    pub owner_id: OwnerId,
    pub display_name: DisplayName,
    pub storage_key: StorageKey,
    pub public_url: String,
    pub created_at: DateTime<Utc>,
}

impl NewFileRecord {
    pub fn new(
        owner_id: OwnerId,
        display_name: DisplayName,
        storage_key: StorageKey,
        public_base_url: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let public_url = storage_key.public_url(public_base_url);
        Self {
            owner_id,
            display_name,
            storage_key,
            public_url,
            created_at,
        }
    }
}

/// File record aggregate root - metadata describing one stored blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    id: FileId,
    owner_id: OwnerId,
    display_name: DisplayName,
    /// Kept as stored: rows written by older code or by hand may hold keys
    /// that no longer parse, and the sweeper must be able to see them.
    storage_key: String,
    public_url: String,
    created_at: DateTime<Utc>,
    state: FileState,
}

impl FileRecord {
    /// Committed record for a freshly inserted row
    pub fn from_new(id: FileId, new: NewFileRecord) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            display_name: new.display_name,
            storage_key: new.storage_key.as_str().to_string(),
            public_url: new.public_url,
            created_at: new.created_at,
            state: FileState::Active,
        }
    }

    /// Reconstruct from storage (e.g., database)
    pub fn reconstruct(
        id: FileId,
        owner_id: OwnerId,
        display_name: DisplayName,
        storage_key: String,
        public_url: String,
        created_at: DateTime<Utc>,
        state: FileState,
    ) -> Self {
        Self {
            id,
            owner_id,
            display_name,
            storage_key,
            public_url,
            created_at,
            state,
        }
    }

    /// Change the display name. Only active records can be renamed.
    pub fn rename(&mut self, display_name: DisplayName) -> Result<(), DomainError> {
        if self.state != FileState::Active {
            return Err(DomainError::CannotRenameInactive(self.state));
        }

        self.display_name = display_name;
        Ok(())
    }

    /// Mark the record as picked up for expiration
    pub fn mark_deleting(&mut self) -> Result<(), DomainError> {
        self.transition(FileState::Deleting)
    }

    /// Mark the record as fully removed
    pub fn mark_deleted(&mut self) -> Result<(), DomainError> {
        self.transition(FileState::Deleted)
    }

    fn transition(&mut self, target: FileState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state,
                to: target,
            });
        }

        self.state = target;
        Ok(())
    }

    /// True when the record was created strictly before `threshold`
    pub fn is_older_than(&self, threshold: DateTime<Utc>) -> bool {
        self.created_at < threshold
    }

    pub fn parsed_storage_key(&self) -> Result<StorageKey, DomainError> {
        StorageKey::parse(self.storage_key.as_str())
    }

    // Getters
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> FileState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == FileState::Active
    }
}
