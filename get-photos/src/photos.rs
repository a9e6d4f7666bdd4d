//! Photo listing: one bucket listing, one presigned URL per object

use aws_lambda_events::{
    apigw::{ApiGatewayV2httpRequest, ApiGatewayV2httpResponse},
    encodings::Body,
};
use axum::response::{IntoResponse, Response};
use common_types::PhotoUrl;
use futures::future::try_join_all;
use http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use lambda_runtime::LambdaEvent;
use tracing::{debug, error, info, instrument};

use crate::photo_storage::{BucketError, BucketResult, PhotoSource};

/// Lists every photo in the bucket with a presigned retrieval URL
///
/// The presign requests run concurrently and are joined; output order is
/// not guaranteed to follow storage order. The first failure fails the
/// whole call, so a partial list is never returned.
///
/// # Errors
///
/// Returns the first `BucketError` raised by the listing or by any presign
pub async fn list_photos<S>(source: &S) -> BucketResult<Vec<PhotoUrl>>
where
    S: PhotoSource + ?Sized,
{
    let keys = source.list_keys().await?;

    try_join_all(keys.into_iter().map(|key| async move {
        let presigned = source.presign_get(&key).await?;
        debug!(key = %key, expires_at = %presigned.expires_at, "presigned photo URL");
        Ok::<_, BucketError>(PhotoUrl {
            filename: key,
            url: presigned.url,
        })
    }))
    .await
}

/// Outcome of one listing request, independent of the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotosResponse {
    /// 200 on success, 500 on any failure
    pub status: StatusCode,
    /// JSON array on success, error text on failure
    pub body: String,
}

impl PhotosResponse {
    /// Maps a listing result to the response sent to the caller
    #[must_use]
    pub fn from_result(result: BucketResult<Vec<PhotoUrl>>) -> Self {
        match result.map(|photos| serde_json::to_string(&photos)) {
            Ok(Ok(body)) => Self {
                status: StatusCode::OK,
                body,
            },
            Ok(Err(e)) => Self::failure(e.to_string()),
            Err(e) => Self::failure(e.to_string()),
        }
    }

    fn failure(message: String) -> Self {
        error!("Failed to list photos: {message}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: message,
        }
    }

    /// Content type matching the body
    #[must_use]
    pub fn content_type(&self) -> HeaderValue {
        if self.status.is_success() {
            HeaderValue::from_static("application/json")
        } else {
            HeaderValue::from_static("text/plain; charset=utf-8")
        }
    }
}

/// Runs one listing request end to end
#[instrument(skip(source))]
pub async fn get_photos<S>(source: &S) -> PhotosResponse
where
    S: PhotoSource + ?Sized,
{
    let result = list_photos(source).await;
    if let Ok(photos) = &result {
        info!(count = photos.len(), "listed photos");
    }
    PhotosResponse::from_result(result)
}

impl IntoResponse for PhotosResponse {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        (self.status, [(CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

impl From<PhotosResponse> for ApiGatewayV2httpResponse {
    fn from(response: PhotosResponse) -> Self {
        let mut lambda_response = Self::default();
        lambda_response.status_code = i64::from(response.status.as_u16());
        lambda_response
            .headers
            .insert(CONTENT_TYPE, response.content_type());
        lambda_response.body = Some(Body::Text(response.body));
        lambda_response
    }
}

/// Lambda entry point for API Gateway HTTP API (payload format 2.0) events
///
/// The event carries no input the listing needs. Failures are already
/// folded into a 500 response, so this never returns `Err`.
///
/// # Errors
///
/// Infallible in practice; the signature matches `lambda_runtime::service_fn`
pub async fn function_handler<S>(
    event: LambdaEvent<ApiGatewayV2httpRequest>,
    source: &S,
) -> Result<ApiGatewayV2httpResponse, lambda_runtime::Error>
where
    S: PhotoSource + ?Sized,
{
    let request_id = event.context.request_id;
    info!(%request_id, "getPhotos invoked");

    Ok(get_photos(source).await.into())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::StaticPhotoSource;

    #[tokio::test]
    async fn test_empty_bucket_returns_empty_list() {
        let source = StaticPhotoSource::new(Vec::<String>::new());

        let response = get_photos(&source).await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, "[]");
    }

    #[tokio::test]
    async fn test_one_url_per_listed_key() {
        let source = StaticPhotoSource::new(["mario.png", "luigi.png", "peach.jpg"]);

        let photos = list_photos(&source).await.unwrap();

        assert_eq!(photos.len(), 3);
        let mut filenames: Vec<_> = photos.iter().map(|p| p.filename.as_str()).collect();
        filenames.sort_unstable();
        assert_eq!(filenames, vec!["luigi.png", "mario.png", "peach.jpg"]);
        for photo in &photos {
            assert_eq!(photo.url, StaticPhotoSource::url_for(&photo.filename));
        }
    }

    #[tokio::test]
    async fn test_listing_failure_is_500_with_error_text() {
        let source = StaticPhotoSource::failing_list(BucketError::S3Error(
            "NoSuchBucket: The specified bucket does not exist".to_string(),
        ));

        let response = get_photos(&source).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.body,
            "S3 service error: NoSuchBucket: The specified bucket does not exist"
        );
    }

    #[tokio::test]
    async fn test_single_presign_failure_fails_whole_response() {
        let source = StaticPhotoSource::new(["mario.png", "bowser.png", "toad.png"])
            .failing_presign("bowser.png");

        let response = get_photos(&source).await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.body.contains("mario.png"));
        assert!(response.body.contains("bowser.png"));
    }

    #[test]
    fn test_lambda_response_shape() {
        let response = PhotosResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".to_string(),
        };

        let lambda_response = ApiGatewayV2httpResponse::from(response);

        assert_eq!(lambda_response.status_code, 500);
        assert_eq!(lambda_response.body, Some(Body::Text("boom".to_string())));
        assert_eq!(
            lambda_response.headers.get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_function_handler_success() {
        let source = StaticPhotoSource::new(["yoshi.png"]);
        let event = LambdaEvent::new(
            ApiGatewayV2httpRequest::default(),
            lambda_runtime::Context::default(),
        );

        let response = function_handler(event, &source).await.unwrap();

        assert_eq!(response.status_code, 200);
        let Some(Body::Text(body)) = response.body else {
            panic!("expected a text body");
        };
        let photos: Vec<PhotoUrl> = serde_json::from_str(&body).unwrap();
        assert_eq!(
            photos,
            vec![PhotoUrl {
                filename: "yoshi.png".to_string(),
                url: StaticPhotoSource::url_for("yoshi.png"),
            }]
        );
        assert_eq!(
            response.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
