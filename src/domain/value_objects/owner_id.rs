use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Identifier of the principal that uploaded a file.
///
/// Authentication happens upstream; this only guards against values that
/// cannot be used as a cache key component or a query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    const MAX_LENGTH: usize = 255;

    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.trim().is_empty() {
            return Err(DomainError::InvalidOwnerId(
                "Owner ID cannot be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LENGTH {
            return Err(DomainError::InvalidOwnerId(format!(
                "Owner ID too long: {} > {}",
                value.len(),
                Self::MAX_LENGTH
            )));
        }

        if value.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(DomainError::InvalidOwnerId(
                "Owner ID must not contain whitespace or control characters".to_string(),
            ));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OwnerId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
