//! S3-compatible storage implementation using MinIO client
//!
//! Works with AWS S3, MinIO, Google Cloud Storage in interoperability mode and
//! any other S3-compatible object storage.

use async_trait::async_trait;
use bytes::Bytes;
use minio::s3::{
    client::Client,
    creds::StaticProvider,
    error::{Error, ErrorCode},
    http::BaseUrl,
    segmented_bytes::SegmentedBytes,
    types::S3Api,
};
use std::str::FromStr;

use crate::storage::blob_storage::{BlobStorage, StorageError};

/// Maximum object key length accepted by S3
const MAX_KEY_LEN: usize = 1024;

/// S3-compatible storage implementation using MinIO client
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Create a new S3 storage instance
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create S3 storage from environment variables
    ///
    /// Expects:
    /// - S3_ENDPOINT_URL
    /// - S3_ACCESS_KEY_ID
    /// - S3_SECRET_ACCESS_KEY
    ///
    /// The bucket is part of the storage configuration, not of the client.
    pub fn from_env() -> Result<Self, StorageError> {
        let endpoint_url = required_env("S3_ENDPOINT_URL")?;
        let access_key = required_env("S3_ACCESS_KEY_ID")?;
        let secret_key = required_env("S3_SECRET_ACCESS_KEY")?;

        let base_url = BaseUrl::from_str(&endpoint_url)
            .map_err(|e| StorageError::Backend(format!("Invalid S3_ENDPOINT_URL: {}", e)))?;

        let creds_provider = StaticProvider::new(&access_key, &secret_key, None);

        let client = Client::new(
            base_url,
            Some(Box::new(creds_provider)),
            None, // Default region
            None, // No custom HTTP client
        )
        .map_err(|e| StorageError::Backend(format!("Failed to create S3 client: {}", e)))?;

        Ok(Self::new(client))
    }

    /// Validate S3 key format
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "Key must be between 1 and {} characters",
                MAX_KEY_LEN
            )));
        }

        if key.starts_with('/') || key.ends_with('/') {
            return Err(StorageError::InvalidKey(
                "Key cannot start or end with '/'".into(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn put(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), StorageError> {
        Self::validate_key(key)?;

        let bytes = SegmentedBytes::from(Bytes::from(data));

        self.client
            .put_object(bucket, key, bytes)
            .send()
            .await
            .map_err(|e| classify(format!("Failed to put file '{}'", key), &e))?;

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Self::validate_key(key)?;

        let response = match self.client.get_object(bucket, key).send().await {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => return Err(classify(format!("Failed to get file '{}'", key), &e)),
        };

        let content = response.content.to_segmented_bytes().await.map_err(|e| {
            StorageError::Backend(format!("Failed to read file '{}' content: {}", key, e))
        })?;

        Ok(Some(content.to_bytes().to_vec()))
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        Self::validate_key(key)?;

        match self.client.stat_object(bucket, key).send().await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(classify(
                format!("Failed to check existence of file '{}'", key),
                &e,
            )),
        }
    }
}

fn required_env(var: &str) -> Result<String, StorageError> {
    std::env::var(var)
        .map_err(|_| StorageError::Backend(format!("{} environment variable not set", var)))
}

/// S3 error code carried by a service error response, if any
fn error_code(e: &Error) -> Option<&ErrorCode> {
    match e {
        Error::S3Error(response) => Some(&response.code),
        _ => None,
    }
}

/// Codes meaning the object is absent; a missing bucket is a failure
fn is_missing_object(code: &ErrorCode) -> bool {
    matches!(code, ErrorCode::NoSuchKey | ErrorCode::ResourceNotFound)
}

fn is_not_found(e: &Error) -> bool {
    error_code(e).is_some_and(is_missing_object)
}

fn classify(context: String, e: &Error) -> StorageError {
    match error_code(e) {
        Some(ErrorCode::AccessDenied) => StorageError::AccessDenied(format!("{}: {}", context, e)),
        _ => StorageError::Backend(format!("{}: {}", context, e)),
    }
}
