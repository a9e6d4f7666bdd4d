pub mod environment;
mod error;

pub use environment::Environment;
pub use error::ConfigError;
