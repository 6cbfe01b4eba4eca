//! Storage backends for archived log files

pub mod blob_storage;

pub use blob_storage::{BlobStorage, MemoryStorage, StorageError};

// S3 implementation
#[cfg(feature = "s3")]
pub mod s3_storage;
