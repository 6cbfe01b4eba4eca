//! # Execlog Store
//!
//! Archives execution log files in an S3-compatible blob store and reads them
//! back. Each execution gets its own key prefix, expanded from a configurable
//! path template such as `project/${job.project}/${job.execid}`; every file
//! type (`rdlog`, `state.json`, ...) is stored as `<prefix>.<file type>`.
//!
//! ## Core Concepts
//!
//! - **Path templates** contain `${job.<key>}` placeholders filled from the
//!   [`ExecutionContext`]. Missing values are dropped and separators collapsed.
//! - **Initialization** validates bucket and path once per execution and fixes
//!   the expanded prefix; misconfiguration is a [`ConfigurationError`].
//! - **Operations** (`is_available`, `store`, `retrieve`) are independent
//!   requests against the blob store. A file that was never stored is not an
//!   error; failed requests are an [`AdapterError`].
//!
//! ## Example Usage
//!
//! ```rust
//! use execlog_store::*;
//! use execlog_store::storage::MemoryStorage;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::new("execution-logs");
//! let context = ExecutionContext::new()
//!     .with_execid("42")
//!     .with_project("ops");
//!
//! let logs = LogFileStorage::initialize(MemoryStorage::new(), &config, &context)?;
//! assert_eq!(logs.storage_key(RDLOG), "project/ops/42.rdlog");
//!
//! logs.store(RDLOG, &b"hello"[..], 5, None).await?;
//!
//! let mut sink = Vec::new();
//! let retrieved = logs.retrieve(RDLOG, &mut sink).await?;
//! assert_eq!(retrieved, Retrieved::Written { bytes: 5 });
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod expand;
pub mod log_storage;
pub mod storage;

pub use config::{ExpandedPath, StorageConfig};
pub use context::ExecutionContext;
pub use error::{AdapterError, ConfigurationError, Result};
pub use log_storage::{LogFileStorage, RDLOG, Retrieved, STATE};
pub use storage::{BlobStorage, StorageError};

#[cfg(feature = "s3")]
pub use storage::s3_storage::S3Storage;
