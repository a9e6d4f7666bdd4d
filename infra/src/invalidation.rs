//! CloudFront cache invalidation after the website is re-seeded

use aws_sdk_cloudfront::{
    error::DisplayErrorContext,
    types::{InvalidationBatch, Paths},
    Client as CloudFrontClient,
};
use chrono::Utc;
use thiserror::Error;
use tracing::info;

/// Path pattern covering every cached object of the distribution
pub const INVALIDATE_ALL: &str = "/*";

/// Errors raised while invalidating a distribution
#[derive(Error, Debug)]
pub enum InvalidationError {
    /// The request could not be assembled
    #[error("Invalid invalidation request: {0}")]
    Build(String),

    /// CloudFront rejected or failed the request
    #[error("Failed to invalidate distribution {distribution_id}: {message}")]
    Request {
        /// Target distribution
        distribution_id: String,
        /// SDK error description
        message: String,
    },
}

/// Paths of a full-site invalidation
///
/// # Errors
///
/// Returns `InvalidationError::Build` if the SDK rejects the paths
pub fn invalidation_paths() -> Result<Paths, InvalidationError> {
    Paths::builder()
        .quantity(1)
        .items(INVALIDATE_ALL)
        .build()
        .map_err(|e| InvalidationError::Build(e.to_string()))
}

/// A full-site invalidation batch
///
/// CloudFront deduplicates batches by `caller_reference`, so each seed run
/// needs its own.
///
/// # Errors
///
/// Returns `InvalidationError::Build` if the SDK rejects the batch
pub fn invalidation_batch(caller_reference: &str) -> Result<InvalidationBatch, InvalidationError> {
    InvalidationBatch::builder()
        .paths(invalidation_paths()?)
        .caller_reference(caller_reference)
        .build()
        .map_err(|e| InvalidationError::Build(e.to_string()))
}

/// Invalidates every cached object of `distribution_id`
///
/// Returns the id of the created invalidation.
///
/// # Errors
///
/// Returns `InvalidationError` if the batch cannot be built or CloudFront
/// refuses the request
pub async fn invalidate_all(
    client: &CloudFrontClient,
    distribution_id: &str,
) -> Result<String, InvalidationError> {
    let caller_reference = format!("simple-app-{}", Utc::now().timestamp_millis());

    let output = client
        .create_invalidation()
        .distribution_id(distribution_id)
        .invalidation_batch(invalidation_batch(&caller_reference)?)
        .send()
        .await
        .map_err(|e| InvalidationError::Request {
            distribution_id: distribution_id.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    let invalidation_id = output
        .invalidation()
        .map(|invalidation| invalidation.id().to_string())
        .unwrap_or_default();

    info!(
        distribution_id,
        invalidation_id = %invalidation_id,
        "invalidated distribution cache"
    );
    Ok(invalidation_id)
}
