use chrono::{DateTime, Utc};
use std::time::Duration;

/// Configuration for the expiration sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often a sweep is triggered
    pub interval: Duration,
    /// Records created before `now - retention` are expired
    pub retention: Duration,
    /// Maximum candidates per sweep; `deleting` retries are taken first
    pub batch_size: i64,
    /// Number of records expired concurrently
    pub concurrency: usize,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600), // 1 hour
            retention: Duration::from_secs(3600),
            batch_size: 100,
            concurrency: 10,
        }
    }
}

impl SweeperConfig {
    pub fn new(interval: Duration, retention: Duration, batch_size: i64) -> Self {
        Self {
            interval,
            retention,
            batch_size,
            ..Self::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Creation time before which a record is expired
    pub fn retention_threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.retention)
            .ok()
            .and_then(|retention| now.checked_sub_signed(retention))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}
