//! Storage configuration and initialization-time validation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::ExecutionContext;
use crate::error::ConfigurationError;
use crate::expand::{DEFAULT_PATH_FORMAT, EXECID_PLACEHOLDER, SEPARATOR, expand_path};

/// Environment variable holding the bucket name
pub const BUCKET_ENV: &str = "EXECLOG_BUCKET";

/// Environment variable holding the path template
pub const PATH_ENV: &str = "EXECLOG_PATH";

/// User-supplied storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket to store files in. Required, never defaulted.
    pub bucket: Option<String>,

    /// Path template for the stored log file
    ///
    /// Supports the expansion variables `${job.execid}`, `${job.project}`,
    /// `${job.id}`, `${job.group}` and `${job.name}`.
    #[serde(default = "default_path")]
    pub path: Option<String>,
}

fn default_path() -> Option<String> {
    Some(DEFAULT_PATH_FORMAT.to_string())
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// `EXECLOG_BUCKET` is read as-is (a missing bucket is reported at
    /// initialization), `EXECLOG_PATH` falls back to the default template.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Ok(Self {
            bucket: read_env(BUCKET_ENV)?,
            path: read_env(PATH_ENV)?.or_else(default_path),
        })
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Validate the settings and expand the path for one execution
    ///
    /// Checks run in a fixed order so each misconfiguration reports its own
    /// message: bucket, path presence, path structure, then the expanded value.
    pub fn resolve(
        &self,
        context: &ExecutionContext,
    ) -> Result<(String, ExpandedPath), ConfigurationError> {
        let bucket = non_blank(self.bucket.as_deref()).ok_or(ConfigurationError::BucketNotSet)?;
        let path = non_blank(self.path.as_deref()).ok_or(ConfigurationError::PathNotSet)?;

        let has_placeholder = path.contains(EXECID_PLACEHOLDER);
        if !has_placeholder && !path.ends_with(SEPARATOR) {
            return Err(ConfigurationError::MissingExecIdPlaceholder {
                path: path.to_string(),
            });
        }

        let format = if has_placeholder {
            path.to_string()
        } else {
            format!("{path}{EXECID_PLACEHOLDER}")
        };

        let expanded = ExpandedPath::new(&format, context)?;
        Ok((bucket.to_string(), expanded))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            path: default_path(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn read_env(var: &str) -> Result<Option<String>, ConfigurationError> {
    match std::env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigurationError::Environment {
            var: var.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Fully expanded, validated key prefix for one execution's files
///
/// Never empty and never ends with a separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpandedPath(String);

impl ExpandedPath {
    /// Expand `format` against `context` and validate the result
    pub fn new(format: &str, context: &ExecutionContext) -> Result<Self, ConfigurationError> {
        let expanded = expand_path(format, context);

        if expanded.trim().is_empty() {
            return Err(ConfigurationError::EmptyExpandedPath {
                path: format.to_string(),
            });
        }
        if expanded.ends_with(SEPARATOR) {
            return Err(ConfigurationError::TrailingSeparator {
                path: format.to_string(),
                expanded,
            });
        }

        Ok(Self(expanded))
    }

    /// Blob key for the given file type, e.g. `project/ops/42.rdlog`
    pub fn storage_key(&self, file_type: &str) -> String {
        format!("{}.{}", self.0, file_type)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ExpandedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpandedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
