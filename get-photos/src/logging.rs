use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

use crate::types::Environment;

/// Installs the global tracing subscriber
///
/// JSON lines when deployed (CloudWatch), human-readable output in
/// development. `RUST_LOG` overrides the environment's default level.
pub fn init(environment: &Environment) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();

    match environment {
        Environment::Production => {
            fmt()
                .json()
                .without_time()
                .with_env_filter(filter)
                .init();
        }
        Environment::Development { .. } => {
            fmt().with_env_filter(filter).init();
        }
    }
}
