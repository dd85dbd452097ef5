//! Object-storage collaborator (MinIO or any S3-compatible endpoint).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::StorageConfig;

/// Opaque blob store: put bytes under a key, hand out time-limited URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object, creating the bucket on first use. Returns the key.
    async fn put(&self, bucket: &str, key: &str, bytes: &[u8], content_type: &str)
        -> Result<String>;

    /// Time-limited GET URL for a stored object.
    async fn presign(&self, bucket: &str, key: &str, ttl_seconds: u64) -> Result<String>;
}

pub struct S3ObjectStore {
    client: Client,
    op_timeout: Duration,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let endpoint_url = if config.endpoint.contains("://") {
            config.endpoint.clone()
        } else {
            let scheme = if config.secure { "https" } else { "http" };
            format!("{scheme}://{}", config.endpoint)
        };

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "debrief-config",
        );

        // Region is required by the SDK but meaningless for MinIO.
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(&endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        info!("Initialized object store at {}", endpoint_url);

        Ok(Self {
            client: Client::from_conf(s3_config),
            op_timeout: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// Create the bucket if it does not exist. Duplicate creation from a
    /// concurrent first use is fine: the service reports already-exists /
    /// already-owned and we treat both as success.
    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        let head = tokio::time::timeout(
            self.op_timeout,
            self.client.head_bucket().bucket(bucket).send(),
        )
        .await
        .map_err(|_| anyhow!("Timed out checking bucket {bucket}"))?;

        if head.is_ok() {
            return Ok(());
        }

        debug!("Bucket {} not found, creating it", bucket);

        let created = tokio::time::timeout(
            self.op_timeout,
            self.client.create_bucket().bucket(bucket).send(),
        )
        .await
        .map_err(|_| anyhow!("Timed out creating bucket {bucket}"))?;

        match created {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(ctx))
                if ctx.err().is_bucket_already_owned_by_you()
                    || ctx.err().is_bucket_already_exists() =>
            {
                Ok(())
            }
            Err(err) => Err(anyhow!("Failed to create bucket {bucket}: {err}")),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        self.ensure_bucket(bucket).await?;

        let upload = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send();

        tokio::time::timeout(self.op_timeout, upload)
            .await
            .map_err(|_| anyhow!("Timed out uploading {bucket}/{key}"))?
            .with_context(|| format!("Failed to upload {bucket}/{key}"))?;

        info!("Stored {} bytes at {}/{}", bytes.len(), bucket, key);

        Ok(key.to_string())
    }

    async fn presign(&self, bucket: &str, key: &str, ttl_seconds: u64) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_seconds))
            .context("Invalid presign TTL")?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning);

        let presigned = tokio::time::timeout(self.op_timeout, request)
            .await
            .map_err(|_| anyhow!("Timed out presigning {bucket}/{key}"))?
            .with_context(|| format!("Failed to presign {bucket}/{key}"))?;

        Ok(presigned.uri().to_string())
    }
}
