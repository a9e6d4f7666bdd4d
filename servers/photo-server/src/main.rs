//! Local HTTP server for the photo listing function
//!
//! Serves the same `GET /getPhotos` handler the Lambda runs, so the frontend
//! can be developed against `LocalStack` or a real bucket.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use aws_sdk_s3::Client as S3Client;
use get_photos::{logging, photo_storage::PhotoStorage, routes, types::Environment};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let environment = Environment::from_env()?;
    logging::init(&environment);

    let bucket_name = environment.photo_bucket()?;
    info!("Starting photo server for bucket: {bucket_name}");

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let photo_storage = Arc::new(PhotoStorage::new(
        s3_client,
        bucket_name,
        environment.presigned_url_expiry(),
    ));

    let app = routes::handler(photo_storage)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(5)));

    let addr = SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(3000), |p| p.parse())?,
    ));
    let listener = TcpListener::bind(addr).await?;
    info!("Photo server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Photo server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl+C: {e}"),
    }
}
