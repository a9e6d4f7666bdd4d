//! S3-backed photo storage operations
mod error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{presigning::PresigningConfig, Client as S3Client};
use chrono::{DateTime, Utc};
use tracing::debug;

pub use error::{BucketError, BucketResult};

/// Presigned retrieval window for photos: 24 hours
pub const PRESIGNED_URL_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Presigned URL with expiration information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    /// The presigned URL for GET operations
    pub url: String,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Read access to the photos of one bucket
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Lists the object keys currently in the bucket
    ///
    /// # Errors
    ///
    /// Returns a `BucketError` if the listing call fails
    async fn list_keys(&self) -> BucketResult<Vec<String>>;

    /// Generates a time-limited retrieval URL for `key`
    ///
    /// # Errors
    ///
    /// Returns a `BucketError` if the URL cannot be signed
    async fn presign_get(&self, key: &str) -> BucketResult<PresignedUrl>;
}

/// Photo storage client for S3 operations
pub struct PhotoStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    presigned_url_expiry: Duration,
}

impl PhotoStorage {
    /// Creates a new photo storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket holding the photos
    /// * `presigned_url_expiry` - Validity window of generated URLs
    #[must_use]
    pub const fn new(
        s3_client: Arc<S3Client>,
        bucket_name: String,
        presigned_url_expiry: Duration,
    ) -> Self {
        Self {
            s3_client,
            bucket_name,
            presigned_url_expiry,
        }
    }
}

#[async_trait]
impl PhotoSource for PhotoStorage {
    /// Lists the bucket with a single `ListObjectsV2` call
    ///
    /// Continuation tokens are not followed, so at most one page of keys
    /// (1000 by default) is returned. A response without `Contents` is an
    /// empty bucket.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::S3Error` for S3 service errors
    /// Returns `BucketError::UpstreamError` for 5xx errors
    /// Returns `BucketError::AwsError` for dispatch or timeout failures
    async fn list_keys(&self) -> BucketResult<Vec<String>> {
        let output = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket_name)
            .send()
            .await?;

        if output.is_truncated() == Some(true) {
            debug!(
                bucket = %self.bucket_name,
                "listing truncated, returning first page only"
            );
        }

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(ToString::to_string)
            .collect())
    }

    /// Generates a presigned URL for GET operations
    ///
    /// # Errors
    ///
    /// Returns `BucketError::ConfigError` if the presigning window is invalid
    /// Returns `BucketError::S3Error` if presigned URL generation fails
    async fn presign_get(&self, key: &str) -> BucketResult<PresignedUrl> {
        let presigned_config = PresigningConfig::expires_in(self.presigned_url_expiry)
            .map_err(|e| {
                BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
            })?;

        let presigned_url = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(presigned_config)
            .await
            .map_err(|e| BucketError::S3Error(format!("Failed to generate presigned URL: {e}")))?;

        let expires_at: DateTime<Utc> = Utc::now() + self.presigned_url_expiry;

        Ok(PresignedUrl {
            url: presigned_url.uri().to_string(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use aws_config::{BehaviorVersion, Region};
    use aws_credential_types::Credentials;

    use super::*;

    fn offline_storage(expiry: Duration) -> PhotoStorage {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::from_keys("test", "test", None))
            .build();

        PhotoStorage::new(
            Arc::new(S3Client::from_conf(config)),
            "photo-bucket".to_string(),
            expiry,
        )
    }

    #[tokio::test]
    async fn test_presigned_get_url_carries_24h_expiry() {
        let storage = offline_storage(PRESIGNED_URL_EXPIRY);
        let before = Utc::now();

        let presigned = storage.presign_get("mario.png").await.unwrap();

        assert!(presigned.url.contains("photo-bucket"));
        assert!(presigned.url.contains("mario.png"));
        assert!(presigned.url.contains("X-Amz-Expires=86400"));
        assert!(presigned.url.contains("X-Amz-Signature="));

        let window = presigned.expires_at - before;
        assert!(window >= chrono::Duration::hours(24));
        assert!(window < chrono::Duration::hours(24) + chrono::Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_presigned_get_url_uses_configured_window() {
        let storage = offline_storage(Duration::from_secs(30));

        let presigned = storage.presign_get("luigi.jpg").await.unwrap();

        assert!(presigned.url.contains("X-Amz-Expires=30"));
    }

    #[tokio::test]
    async fn test_presign_rejects_window_over_a_week() {
        let storage = offline_storage(Duration::from_secs(8 * 24 * 60 * 60));

        let result = storage.presign_get("peach.png").await;

        assert!(matches!(result, Err(BucketError::ConfigError(_))));
    }
}
