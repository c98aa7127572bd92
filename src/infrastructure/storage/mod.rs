mod in_memory_blob_store;
mod local_filesystem_store;
mod s3_blob_store;

pub use in_memory_blob_store::InMemoryBlobStore;
pub use local_filesystem_store::LocalFilesystemStore;
pub use s3_blob_store::S3BlobStore;
