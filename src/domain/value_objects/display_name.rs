use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// User-supplied original file name. Never used as a storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayName(String);

impl DisplayName {
    const MAX_LENGTH: usize = 255;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidDisplayName(
                "Display name cannot be empty".to_string(),
            ));
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidDisplayName(format!(
                "Display name too long: {} > {}",
                trimmed.len(),
                Self::MAX_LENGTH
            )));
        }

        if trimmed.chars().any(|c| c.is_control()) {
            return Err(DomainError::InvalidDisplayName(
                "Display name must not contain control characters".to_string(),
            ));
        }

        if trimmed.contains('/') || trimmed.contains('\\') {
            return Err(DomainError::InvalidDisplayName(
                "Display name must not contain path separators".to_string(),
            ));
        }

        if trimmed == "." || trimmed == ".." {
            return Err(DomainError::InvalidDisplayName(format!(
                "Display name cannot be '{}'",
                trimmed
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage-safe rendition: ASCII alphanumerics, '.', '-' and '_' survive,
    /// everything else collapses to '_'.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
