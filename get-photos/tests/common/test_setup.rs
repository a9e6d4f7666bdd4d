use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use get_photos::{photo_storage::PhotoSource, routes, testing::StaticPhotoSource};
use tower::ServiceExt;

/// Initializes test logging once per binary
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to an in-memory photo source
pub struct TestSetup {
    pub router: Router,
}

impl TestSetup {
    pub fn new(photo_source: StaticPhotoSource) -> Self {
        Self::with_source(Arc::new(photo_source))
    }

    pub fn with_source(photo_source: Arc<dyn PhotoSource>) -> Self {
        setup_test_env();

        let router = routes::handler(photo_source);

        Self { router }
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .header("Origin", "https://gallery.example.com")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_preflight_request(
        &self,
        route: &str,
        method: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("OPTIONS")
            .header("Origin", "https://gallery.example.com")
            .header("Access-Control-Request-Method", method)
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

pub async fn read_body(response: Response) -> Result<String, Box<dyn std::error::Error>> {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(body.to_vec())?)
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = read_body(response).await.expect("Failed to read body");
    serde_json::from_str(&body).expect("Body is not JSON")
}
