pub mod cache;
pub mod clock;
pub mod notifications;
pub mod persistence;
pub mod storage;
