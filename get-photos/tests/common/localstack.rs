use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use chrono::Utc;
use get_photos::{photo_storage::PhotoStorage, types::Environment};

/// Test context backed by a fresh bucket on `LocalStack`
pub struct LocalStackContext {
    pub environment: Environment,
    pub s3_client: Arc<S3Client>,
    pub bucket_name: String,
}

impl LocalStackContext {
    pub async fn new(presign_expiry_override: Option<u64>) -> Self {
        // Credentials and region for the SDK default chain
        dotenvy::from_path(".env.example").ok();
        super::setup_test_env();

        let environment = Environment::Development {
            presign_expiry_override,
        };
        let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));

        Self {
            environment,
            s3_client,
            bucket_name: unique_bucket_name("photos"),
        }
    }

    /// Whether `LocalStack` answers on its edge port
    pub async fn is_available(&self) -> bool {
        self.s3_client.list_buckets().send().await.is_ok()
    }

    pub async fn create_bucket(&self) -> Result<(), aws_sdk_s3::Error> {
        self.s3_client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await?;
        Ok(())
    }

    pub async fn put_photo(&self, key: &str, body: &[u8]) -> Result<(), aws_sdk_s3::Error> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type("image/png")
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await?;
        Ok(())
    }

    /// Storage client over this context's bucket with the environment's URL window
    pub fn photo_storage(&self) -> PhotoStorage {
        PhotoStorage::new(
            self.s3_client.clone(),
            self.bucket_name.clone(),
            self.environment.presigned_url_expiry(),
        )
    }

    pub fn presigned_url_expiry(&self) -> Duration {
        self.environment.presigned_url_expiry()
    }
}

/// Bucket name unique per test run, within the 63 character limit
pub fn unique_bucket_name(prefix: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{prefix}-{nanos}")
}

/// Fetches a presigned URL the way a browser would
pub async fn fetch_url(url: &str) -> Result<reqwest::Response, reqwest::Error> {
    reqwest::Client::new().get(url).send().await
}
