use serde::{Deserialize, Serialize};

/// Object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Bucket holding the uploaded images.
    pub s3: S3StorageConfig,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.s3.validate()
    }
}

/// S3-compatible object storage configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct S3StorageConfig {
    /// S3 bucket name.
    pub bucket: String,

    /// AWS region (e.g., "us-east-1").
    /// If not specified, the default AWS provider chain decides.
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible services.
    /// Examples:
    /// - MinIO: "http://localhost:9000"
    /// - R2: "https://<account-id>.r2.cloudflarestorage.com"
    #[serde(default)]
    pub endpoint: Option<String>,

    /// AWS access key ID.
    /// If not specified, uses environment variables or IAM role.
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// AWS secret access key.
    /// If not specified, uses environment variables or IAM role.
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Use path-style URLs instead of virtual-hosted style.
    /// Required for MinIO and some S3-compatible services.
    #[serde(default)]
    pub force_path_style: bool,

    /// Maximum keys per DeleteObjects request. S3 caps this at 1000.
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
}

impl std::fmt::Debug for S3StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field(
                "access_key_id",
                &self.access_key_id.as_ref().map(|_| "****"),
            )
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "****"),
            )
            .field("force_path_style", &self.force_path_style)
            .field("delete_batch_size", &self.delete_batch_size)
            .finish()
    }
}

impl S3StorageConfig {
    /// Validate S3 configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("S3 bucket name cannot be empty".to_string());
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(
                "S3 access_key_id and secret_access_key must be set together".to_string(),
            );
        }
        if !(1..=MAX_DELETE_BATCH_SIZE).contains(&self.delete_batch_size) {
            return Err(format!(
                "S3 delete_batch_size must be between 1 and {}",
                MAX_DELETE_BATCH_SIZE
            ));
        }
        Ok(())
    }
}

/// Upper bound S3 accepts for one DeleteObjects request.
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

fn default_delete_batch_size() -> usize {
    MAX_DELETE_BATCH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3(bucket: &str) -> S3StorageConfig {
        S3StorageConfig {
            bucket: bucket.to_string(),
            region: Some("ap-northeast-2".to_string()),
            endpoint: None,
            access_key_id: Some("AKIAEXAMPLEKEY".to_string()),
            secret_access_key: Some("wJalrSECRETVALUE".to_string()),
            force_path_style: false,
            delete_batch_size: default_delete_batch_size(),
        }
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let debug = format!("{:?}", s3("images"));
        assert!(debug.contains("images"));
        assert!(!debug.contains("AKIAEXAMPLEKEY"));
        assert!(!debug.contains("wJalrSECRETVALUE"));
        assert!(debug.contains("****"));
    }

    #[test]
    fn test_validate_rejects_empty_bucket() {
        assert!(s3("  ").validate().is_err());
        assert!(s3("images").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_half_credentials() {
        let mut config = s3("images");
        config.secret_access_key = None;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_batch_size_bounds() {
        let mut config = s3("images");
        config.delete_batch_size = 0;
        assert!(config.validate().is_err());
        config.delete_batch_size = 1001;
        assert!(config.validate().is_err());
        config.delete_batch_size = 1;
        assert!(config.validate().is_ok());
    }
}
