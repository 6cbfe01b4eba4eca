//! Blob storage abstraction
//!
//! This module provides the core storage trait and an in-memory implementation
//! for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid key format: {0}")]
    InvalidKey(String),
}

/// Abstraction for blob storage backends
///
/// A missing object is not an error: `exists` answers `false` and `get`
/// answers `None`. Errors are reserved for failed requests.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Create or overwrite the object at `key` with `data`
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve the full content of the object at `key`, if it exists
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Check whether an object currently exists at `key`
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone)]
enum Entry {
    Live(Vec<u8>),
    // Deleted object whose handle is still listed
    Tombstone,
}

/// In-memory storage implementation for testing
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<HashMap<(String, String), Entry>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Replace an object with a stale handle that no longer exists
    pub fn tombstone(&self, bucket: &str, key: &str) {
        self.entries()
            .insert((bucket.to_string(), key.to_string()), Entry::Tombstone);
    }

    /// Get all stored keys in a bucket, tombstones included (useful for testing)
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.entries()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Get number of stored items
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Check if storage is empty
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    // Entries are replaced whole, so the map stays valid after a panic
    // while the lock was held
    fn entries(&self) -> MutexGuard<'_, HashMap<(String, String), Entry>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, bucket: &str, key: &str) -> Option<Entry> {
        self.entries()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        self.entries()
            .insert((bucket.to_string(), key.to_string()), Entry::Live(data));
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.lookup(bucket, key) {
            Some(Entry::Live(data)) => Ok(Some(data)),
            Some(Entry::Tombstone) | None => Ok(None),
        }
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        Ok(matches!(self.lookup(bucket, key), Some(Entry::Live(_))))
    }
}
