//! Startup configuration errors

use thiserror::Error;

/// Errors raised while reading the function's configuration
///
/// These are fatal: the process exits before serving any request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty
    #[error("{0} environment variable is not set")]
    MissingVariable(&'static str),

    /// `APP_ENV` holds an unknown value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
}
