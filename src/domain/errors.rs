use thiserror::Error;

use super::value_objects::FileState;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: FileState, to: FileState },

    #[error("Cannot rename file in {0} state")]
    CannotRenameInactive(FileState),

    #[error("Invalid owner ID: {0}")]
    InvalidOwnerId(String),

    #[error("Invalid display name: {0}")]
    InvalidDisplayName(String),

    #[error("Invalid storage key: {0}")]
    InvalidStorageKey(String),
}
