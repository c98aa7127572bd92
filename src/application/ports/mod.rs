mod blob_store;
mod cache_store;
mod clock;
mod file_repository;
mod upload_events;

pub use blob_store::{BlobReader, BlobStore, StorageError};
pub use cache_store::{CacheError, CacheStore};
pub use clock::Clock;
pub use file_repository::{FileRepository, RepositoryError, ScanCursor, ScanPage};
pub use upload_events::{UploadCompleted, UploadEventPublisher};

#[cfg(test)]
pub use blob_store::MockBlobStore;
#[cfg(test)]
pub use cache_store::MockCacheStore;
#[cfg(test)]
pub use clock::MockClock;
#[cfg(test)]
pub use file_repository::MockFileRepository;
#[cfg(test)]
pub use upload_events::MockUploadEventPublisher;
