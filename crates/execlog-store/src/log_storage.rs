//! Execution log file storage on top of a blob store
//!
//! [`LogFileStorage`] is built in two phases. [`LogFileStorage::initialize`]
//! validates the configuration and fixes the expanded key prefix for one
//! execution; after that every operation is an independent request against
//! the blob store, keyed by `<expanded path>.<file type>`.

use time::OffsetDateTime;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::config::{ExpandedPath, StorageConfig};
use crate::context::ExecutionContext;
use crate::error::{AdapterError, ConfigurationError, Result};
use crate::storage::{BlobStorage, StorageError};

/// File type of the execution log itself
pub const RDLOG: &str = "rdlog";

/// File type of the execution state document
pub const STATE: &str = "state.json";

/// Upper bound on the buffer preallocated from a declared stream length
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Outcome of a successful [`LogFileStorage::retrieve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retrieved {
    /// The file existed and its content was written to the sink
    Written { bytes: usize },

    /// Nothing is stored for this file type yet; the sink was left untouched
    NotFound,
}

impl Retrieved {
    pub fn is_found(&self) -> bool {
        matches!(self, Retrieved::Written { .. })
    }

    /// Number of bytes written to the sink
    pub fn bytes(&self) -> usize {
        match self {
            Retrieved::Written { bytes } => *bytes,
            Retrieved::NotFound => 0,
        }
    }
}

/// Log file storage for a single execution
pub struct LogFileStorage<S> {
    storage: S,
    bucket: String,
    expanded_path: ExpandedPath,
}

impl<S: BlobStorage> LogFileStorage<S> {
    /// Validate `config` and expand its path template for this execution
    pub fn initialize(
        storage: S,
        config: &StorageConfig,
        context: &ExecutionContext,
    ) -> std::result::Result<Self, ConfigurationError> {
        let (bucket, expanded_path) = config.resolve(context)?;
        debug!(%bucket, path = %expanded_path, "Path that will be used");

        Ok(Self {
            storage,
            bucket,
            expanded_path,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn expanded_path(&self) -> &ExpandedPath {
        &self.expanded_path
    }

    /// Underlying blob store
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Blob key used for the given file type
    pub fn storage_key(&self, file_type: &str) -> String {
        self.expanded_path.storage_key(file_type)
    }

    /// Check whether a file of this type has been stored
    pub async fn is_available(&self, file_type: &str) -> Result<bool> {
        let key = self.storage_key(file_type);

        self.storage
            .exists(&self.bucket, &key)
            .await
            .map_err(|source| self.storage_error(key, source))
    }

    /// Read `stream` to the end and store it as this execution's file
    ///
    /// The content is buffered completely before a single put, so a failure
    /// never leaves a partial object behind. `last_modified` is informational
    /// and is not persisted by the blob store.
    pub async fn store<R>(
        &self,
        file_type: &str,
        mut stream: R,
        length: u64,
        last_modified: Option<OffsetDateTime>,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let key = self.storage_key(file_type);

        let capacity = usize::try_from(length)
            .unwrap_or(MAX_PREALLOCATION)
            .min(MAX_PREALLOCATION);
        let mut contents = Vec::with_capacity(capacity);

        if let Err(source) = stream.read_to_end(&mut contents).await {
            return Err(AdapterError::Io { key, source });
        }
        drop(stream);

        check_length(&key, length, contents.len());

        debug!(
            bucket = %self.bucket,
            %key,
            bytes = contents.len(),
            ?last_modified,
            "Storing content"
        );

        self.storage
            .put(&self.bucket, &key, contents)
            .await
            .map_err(|source| self.storage_error(key, source))
    }

    /// Write this execution's file to `sink`, if it has been stored
    ///
    /// The sink is shut down after the content has been written. A missing
    /// file is reported as [`Retrieved::NotFound`], not as an error.
    pub async fn retrieve<W>(&self, file_type: &str, sink: &mut W) -> Result<Retrieved>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let key = self.storage_key(file_type);

        let content = match self.storage.get(&self.bucket, &key).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                debug!(bucket = %self.bucket, %key, "Nothing stored yet");
                return Ok(Retrieved::NotFound);
            }
            Err(source) => return Err(self.storage_error(key, source)),
        };

        debug!(bucket = %self.bucket, %key, bytes = content.len(), "Retrieved content");

        if let Err(source) = write_and_close(sink, &content).await {
            return Err(AdapterError::Io { key, source });
        }

        Ok(Retrieved::Written {
            bytes: content.len(),
        })
    }

    fn storage_error(&self, key: String, source: StorageError) -> AdapterError {
        error!(bucket = %self.bucket, %key, error = %source, "storage request failed");
        AdapterError::Storage { key, source }
    }
}

/// Warn when the bytes read differ from the declared length, returning whether they did
fn check_length(key: &str, declared: u64, actual: usize) -> bool {
    let mismatch = declared != actual as u64;
    if mismatch {
        warn!(key, declared, actual, "stream length differs from declared length");
    }
    mismatch
}

async fn write_and_close<W>(sink: &mut W, content: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    sink.write_all(content).await?;
    sink.shutdown().await
}
