//! Request validation shared by the use cases

use crate::application::dto::UploadRequest;
use crate::application::errors::{LookupError, UploadError};
use crate::domain::value_objects::{DisplayName, OwnerId};

/// Validate owner and display name of an upload
pub fn validate_upload_request(
    request: &UploadRequest,
) -> Result<(OwnerId, DisplayName), UploadError> {
    let owner_id = OwnerId::new(request.owner_id.as_str())
        .map_err(|e| UploadError::InvalidRequest(e.to_string()))?;

    let display_name = DisplayName::new(request.display_name.as_str())
        .map_err(|e| UploadError::InvalidRequest(e.to_string()))?;

    Ok((owner_id, display_name))
}

/// Validate an owner ID for listing
pub fn validate_owner(owner_id: &str) -> Result<OwnerId, LookupError> {
    OwnerId::new(owner_id).map_err(|e| LookupError::InvalidRequest(e.to_string()))
}

/// Normalize a search query: trimmed and lowercased.
///
/// Matching is case-insensitive, so queries differing only in case or
/// surrounding whitespace share one cache entry.
pub fn normalize_search_query(query: &str) -> Result<String, LookupError> {
    let normalized = query.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(LookupError::InvalidRequest(
            "Search query cannot be empty".to_string(),
        ));
    }
    Ok(normalized)
}
