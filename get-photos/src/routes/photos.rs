use std::sync::Arc;

use axum::Extension;

use crate::{
    photo_storage::PhotoSource,
    photos::{get_photos, PhotosResponse},
};

/// Lists the bucket and returns presigned URLs for every photo
///
/// Responds 200 with a JSON array of `{filename, url}` or 500 with the
/// error text. Never returns a partial list.
pub async fn handler(Extension(photo_source): Extension<Arc<dyn PhotoSource>>) -> PhotosResponse {
    get_photos(photo_source.as_ref()).await
}
