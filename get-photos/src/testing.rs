//! In-memory photo source for tests

use async_trait::async_trait;
use chrono::Utc;

use crate::photo_storage::{
    BucketError, BucketResult, PhotoSource, PresignedUrl, PRESIGNED_URL_EXPIRY,
};

/// Photo source backed by a fixed key list
#[derive(Debug, Clone, Default)]
pub struct StaticPhotoSource {
    keys: Vec<String>,
    list_error: Option<BucketError>,
    failing_key: Option<String>,
}

impl StaticPhotoSource {
    /// Source listing exactly `keys`
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Source whose listing call fails with `error`
    #[must_use]
    pub fn failing_list(error: BucketError) -> Self {
        Self {
            list_error: Some(error),
            ..Self::default()
        }
    }

    /// Makes presigning fail for `key`
    #[must_use]
    pub fn failing_presign(mut self, key: &str) -> Self {
        self.failing_key = Some(key.to_string());
        self
    }

    /// URL this source hands out for `key`
    #[must_use]
    pub fn url_for(key: &str) -> String {
        format!(
            "https://photos.s3.amazonaws.com/{key}?X-Amz-Expires={}",
            PRESIGNED_URL_EXPIRY.as_secs()
        )
    }
}

#[async_trait]
impl PhotoSource for StaticPhotoSource {
    async fn list_keys(&self) -> BucketResult<Vec<String>> {
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.keys.clone()),
        }
    }

    async fn presign_get(&self, key: &str) -> BucketResult<PresignedUrl> {
        if self.failing_key.as_deref() == Some(key) {
            return Err(BucketError::S3Error(format!(
                "Failed to generate presigned URL: cannot sign {key}"
            )));
        }

        Ok(PresignedUrl {
            url: Self::url_for(key),
            expires_at: Utc::now() + PRESIGNED_URL_EXPIRY,
        })
    }
}
