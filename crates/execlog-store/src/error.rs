//! Error types for execution log storage
//!
//! Two kinds of failure are distinguished. [`ConfigurationError`] is only ever
//! produced while initializing a [`LogFileStorage`](crate::LogFileStorage) and
//! carries a stable message operators can match on. [`AdapterError`] is produced
//! by the storage operations and always keeps the underlying cause.

use thiserror::Error;

use crate::storage::blob_storage::StorageError;

/// Invalid or missing storage settings, detected at initialization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("bucket was not set")]
    BucketNotSet,

    #[error("path was not set")]
    PathNotSet,

    #[error("path must contain ${{job.execid}} or end with /")]
    MissingExecIdPlaceholder { path: String },

    #[error("expanded value of path was empty")]
    EmptyExpandedPath { path: String },

    #[error("expanded value of path must not end with /: {expanded}")]
    TrailingSeparator { path: String, expanded: String },

    #[error("Environment variable error: {var} - {reason}")]
    Environment { var: String, reason: String },
}

/// Failure while checking, storing or retrieving a log file
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The remote blob store rejected or failed the request
    #[error("storage request for '{key}' failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Reading the input stream or writing the sink failed
    #[error("local I/O for '{key}' failed: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    /// Storage key the failed operation was addressing
    pub fn key(&self) -> &str {
        match self {
            AdapterError::Storage { key, .. } | AdapterError::Io { key, .. } => key,
        }
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, AdapterError>;
