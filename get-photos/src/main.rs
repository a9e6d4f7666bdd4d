use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use get_photos::{
    logging,
    photo_storage::PhotoStorage,
    photos::function_handler,
    types::Environment,
};
use lambda_runtime::{run, service_fn, Error};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let environment = Environment::from_env()?;
    logging::init(&environment);

    // Fails the init phase when the bucket is not configured
    let bucket_name = environment.photo_bucket()?;
    info!("Serving photos from bucket: {bucket_name}");

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let photo_storage = PhotoStorage::new(
        s3_client,
        bucket_name,
        environment.presigned_url_expiry(),
    );

    run(service_fn(|event| function_handler(event, &photo_storage))).await
}
