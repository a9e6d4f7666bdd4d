mod health;
pub mod photos;

use std::sync::Arc;

use axum::{http::Method, routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::photo_storage::PhotoSource;

/// Path of the listing route
pub const GET_PHOTOS_PATH: &str = "/getPhotos";

/// CORS policy matching the deployed HTTP API: every origin, GET only
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
}

/// Creates the router with all handler routes
pub fn handler(photo_source: Arc<dyn PhotoSource>) -> Router {
    Router::new()
        .route(GET_PHOTOS_PATH, get(photos::handler))
        .route("/health", get(health::handler))
        .layer(cors_layer())
        .layer(Extension(photo_source))
}
