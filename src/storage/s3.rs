use async_trait::async_trait;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tracing::{debug, error, info};

use super::{DeleteObjectsReport, ObjectDeleteFailure, ObjectStore, StorageError, StorageResult};
use crate::config::{MAX_DELETE_BATCH_SIZE, S3StorageConfig};

/// S3-compatible object store.
///
/// Works against AWS S3 as well as MinIO, R2 and other services that
/// implement `DeleteObjects`.
pub struct S3ObjectStore {
    config: S3StorageConfig,
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub async fn new(config: S3StorageConfig) -> StorageResult<Self> {
        info!(bucket = %config.bucket, "Initializing S3 object store");

        let mut sdk_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            sdk_config_builder = sdk_config_builder.region(aws_config::Region::new(region.clone()));
        }

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None, // session token
                None, // expiry
                "diary-janitor-config",
            );
            sdk_config_builder = sdk_config_builder.credentials_provider(credentials);
        }

        let sdk_config = sdk_config_builder.load().await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = aws_sdk_s3::Client::from_conf(s3_config_builder.build());

        Ok(Self { config, client })
    }

    fn batch_size(&self) -> usize {
        self.config.delete_batch_size.clamp(1, MAX_DELETE_BATCH_SIZE)
    }

    async fn delete_chunk(&self, keys: &[String]) -> StorageResult<DeleteObjectsReport> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::S3(format!("Invalid object identifier: {}", e)))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| StorageError::S3(format!("Invalid delete request: {}", e)))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.config.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, bucket = %self.config.bucket, "Failed to delete objects from S3");
                StorageError::S3(aws_sdk_s3::error::DisplayErrorContext(&e).to_string())
            })?;

        Ok(DeleteObjectsReport {
            deleted: output
                .deleted()
                .iter()
                .filter_map(|d| d.key().map(str::to_string))
                .collect(),
            errors: output
                .errors()
                .iter()
                .map(|e| ObjectDeleteFailure {
                    key: e.key().unwrap_or_default().to_string(),
                    code: e.code().map(str::to_string),
                    message: e.message().map(str::to_string),
                })
                .collect(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn delete_objects(&self, keys: &[String]) -> StorageResult<DeleteObjectsReport> {
        let mut report = DeleteObjectsReport::default();

        for chunk in keys.chunks(self.batch_size()) {
            debug!(keys = chunk.len(), bucket = %self.config.bucket, "Deleting S3 objects");
            report.merge(self.delete_chunk(chunk).await?);
        }

        info!(
            deleted = report.deleted.len(),
            failed = report.errors.len(),
            bucket = %self.config.bucket,
            "S3 batch delete finished"
        );
        Ok(report)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
