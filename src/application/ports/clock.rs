use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

/// Source of the current time for record timestamps and expiration
#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
