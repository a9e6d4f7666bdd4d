//! Photo gallery listing function
//!
//! Lists the photo bucket and returns a presigned, time-limited retrieval URL
//! per object. Served from AWS Lambda behind an API Gateway HTTP API, or
//! locally through the axum router in [`routes`].

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

/// Log subscriber setup
pub mod logging;

/// Photo S3 storage operations
pub mod photo_storage;

/// Listing flow and its Lambda/HTTP adapters
pub mod photos;

/// HTTP routes for local serving
pub mod routes;

/// Environment configuration
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
