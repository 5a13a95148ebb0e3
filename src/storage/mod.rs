//! Object storage for uploaded images.
//!
//! The janitor only ever deletes objects. [`ObjectStore::delete_objects`]
//! takes one logical batch of keys; backends split it into as many requests
//! as their API requires and fold the per-key outcome into a
//! [`DeleteObjectsReport`].

#[cfg(feature = "s3-storage")]
mod s3;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(feature = "s3-storage")]
pub use s3::S3ObjectStore;
use thiserror::Error;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("S3 error: {0}")]
    S3(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{failed} object(s) could not be deleted, first: {first}")]
    PartialFailure {
        failed: usize,
        first: ObjectDeleteFailure,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A key the object store refused to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDeleteFailure {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

impl std::fmt::Display for ObjectDeleteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(code) = &self.code {
            write!(f, " ({})", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Per-key outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteObjectsReport {
    pub deleted: Vec<String>,
    pub errors: Vec<ObjectDeleteFailure>,
}

impl DeleteObjectsReport {
    pub fn merge(&mut self, other: DeleteObjectsReport) {
        self.deleted.extend(other.deleted);
        self.errors.extend(other.errors);
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of deleted keys, or [`StorageError::PartialFailure`] if any key failed.
    pub fn ensure_complete(self) -> StorageResult<usize> {
        let deleted = self.deleted.len();
        let mut errors = self.errors.into_iter();
        match errors.next() {
            None => Ok(deleted),
            Some(first) => Err(StorageError::PartialFailure {
                failed: 1 + errors.count(),
                first,
            }),
        }
    }
}

/// Trait for pluggable object storage backends.
///
/// Implementations must be `Send + Sync` to support async contexts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete every key in `keys` and report which succeeded.
    ///
    /// A transport or authentication failure is an `Err`; a refusal for an
    /// individual key is recorded in the report instead.
    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsReport>;

    /// Get the backend type name (for logging/debugging).
    fn backend_name(&self) -> &'static str;
}

/// Create the object store described by the configuration.
pub async fn create_object_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    #[cfg(feature = "s3-storage")]
    {
        tracing::info!(bucket = %config.s3.bucket, "Using S3 object storage backend");
        Ok(Arc::new(S3ObjectStore::new(config.s3.clone()).await?))
    }

    #[cfg(not(feature = "s3-storage"))]
    {
        let _ = config;
        Err(StorageError::Config(
            "S3 object storage requires the 's3-storage' feature. \
                Rebuild with: cargo build --features s3-storage"
                .to_string(),
        ))
    }
}
