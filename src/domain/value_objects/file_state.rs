use serde::{Deserialize, Serialize};

/// File record lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    /// Blob stored and metadata committed
    Active,
    /// Picked up for expiration; blob deletion pending or failed
    Deleting,
    /// Blob and row removed
    Deleted,
}

impl FileState {
    /// Check if transition is valid.
    ///
    /// `Deleting -> Deleting` is accepted so a retried expiration can re-mark
    /// a record left behind by an earlier failed run.
    pub fn can_transition_to(&self, target: FileState) -> bool {
        matches!(
            (self, target),
            (FileState::Active, FileState::Deleting)
                | (FileState::Deleting, FileState::Deleting)
                | (FileState::Deleting, FileState::Deleted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileState::Active => "active",
            FileState::Deleting => "deleting",
            FileState::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FileState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(FileState::Active),
            "deleting" => Ok(FileState::Deleting),
            "deleted" => Ok(FileState::Deleted),
            _ => Err(format!("Invalid file state: {}", s)),
        }
    }
}
