//! Bounded waits for external store calls.
//!
//! Every call into the blob store, the metadata store or the cache goes
//! through [`bounded`] so a hung backend turns into an ordinary step failure.

use std::future::Future;
use std::time::Duration;

/// Per-store timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreTimeouts {
    pub blob: Duration,
    pub metadata: Duration,
    pub cache: Duration,
}

impl Default for StoreTimeouts {
    fn default() -> Self {
        Self {
            blob: Duration::from_secs(30),
            metadata: Duration::from_secs(10),
            cache: Duration::from_millis(500),
        }
    }
}

/// Await `fut` for at most `limit`, mapping an elapsed deadline to an error
pub async fn bounded<T, E, F>(
    limit: Duration,
    fut: F,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(limit)),
    }
}
