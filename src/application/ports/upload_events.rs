#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::domain::entities::FileRecord;
use crate::domain::value_objects::{FileId, OwnerId};

/// Emitted once per successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCompleted {
    pub file_id: FileId,
    pub owner_id: OwnerId,
    pub display_name: String,
    pub storage_key: String,
}

impl From<&FileRecord> for UploadCompleted {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_id: record.id(),
            owner_id: record.owner_id().clone(),
            display_name: record.display_name().to_string(),
            storage_key: record.storage_key().to_string(),
        }
    }
}

/// Fire-and-forget sink for upload notifications.
///
/// Publishing never fails from the caller's point of view; delivery to
/// connected clients is the subscriber's concern.
#[cfg_attr(test, automock)]
pub trait UploadEventPublisher: Send + Sync {
    fn publish(&self, event: UploadCompleted);
}
