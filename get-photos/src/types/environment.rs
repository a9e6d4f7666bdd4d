//! Environment configuration for the listing function

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

use crate::photo_storage::PRESIGNED_URL_EXPIRY;

use super::ConfigError;

/// Environment variable naming the photo bucket
pub const PHOTO_BUCKET_NAME_VAR: &str = "PHOTO_BUCKET_NAME";

// Set by the Lambda runtime in every function instance
const LAMBDA_FUNCTION_NAME_VAR: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Deployed on AWS
    Production,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for presigned URL expiry in seconds
        presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// Without `APP_ENV` the Lambda runtime defaults to production and
    /// everything else to development.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` contains an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| {
                if env::var_os(LAMBDA_FUNCTION_NAME_VAR).is_some() {
                    "production".to_string()
                } else {
                    "development".to_string()
                }
            })
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "development" => {
                let presign_expiry_override = env::var("PRESIGNED_URL_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Ok(Self::Development {
                    presign_expiry_override,
                })
            }
            _ => Err(ConfigError::InvalidEnvironment(env)),
        }
    }

    /// Returns the photo bucket name
    ///
    /// The bucket is required in every environment; without it the function
    /// cannot be constructed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVariable` if `PHOTO_BUCKET_NAME` is unset or empty
    pub fn photo_bucket(&self) -> Result<String, ConfigError> {
        env::var(PHOTO_BUCKET_NAME_VAR)
            .ok()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingVariable(PHOTO_BUCKET_NAME_VAR))
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production => None,
            // LocalStack endpoint for development
            Self::Development { .. } => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // LocalStack only serves path-style bucket addressing
        if matches!(self, Self::Development { .. }) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Validity window of presigned photo URLs
    ///
    /// Fixed at 24 hours when deployed; development may shorten it to
    /// exercise the expiry boundary.
    #[must_use]
    pub fn presigned_url_expiry(&self) -> Duration {
        match self {
            Self::Production => PRESIGNED_URL_EXPIRY,
            Self::Development {
                presign_expiry_override,
            } => presign_expiry_override.map_or(PRESIGNED_URL_EXPIRY, Duration::from_secs),
        }
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
