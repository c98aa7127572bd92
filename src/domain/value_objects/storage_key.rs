use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::DisplayName;
use crate::domain::errors::DomainError;

/// Address of a blob in object storage.
///
/// Keys are generated once per upload and never reused: a UUIDv7 gives a
/// time-ordered, collision-resistant prefix, followed by the sanitized
/// display name so that keys stay readable in bucket listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    const PREFIX: &'static str = "uploads";
    const MAX_LENGTH: usize = 1024;

    /// Generate a fresh key for an upload: `uploads/{uuid-v7}_{sanitized-name}`
    pub fn generate(display_name: &DisplayName) -> Self {
        Self(format!(
            "{}/{}_{}",
            Self::PREFIX,
            Uuid::now_v7().simple(),
            display_name.sanitized()
        ))
    }

    /// Validate a key read back from a store
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DomainError::InvalidStorageKey(
                "Storage key cannot be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidStorageKey(format!(
                "Storage key too long: {} > {}",
                value.len(),
                Self::MAX_LENGTH
            )));
        }

        if value.starts_with('/') || value.ends_with('/') {
            return Err(DomainError::InvalidStorageKey(format!(
                "Storage key must be relative: {}",
                value
            )));
        }

        if value
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(DomainError::InvalidStorageKey(format!(
                "Storage key has an empty or relative segment: {}",
                value
            )));
        }

        if value.chars().any(|c| c.is_control() || c == '\\') {
            return Err(DomainError::InvalidStorageKey(
                "Storage key contains forbidden characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public URL for this key under the given base URL
    pub fn public_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StorageKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
