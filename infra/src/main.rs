//! simple-app CLI
//!
//! Synthesizes the gallery's CloudFormation templates and seeds its buckets.

use std::path::PathBuf;

use anyhow::Context;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_cloudfront::Client as CloudFrontClient;
use aws_sdk_s3::Client as S3Client;
use clap::{Parser, Subcommand};
use infra::{
    config::AppConfig,
    invalidation,
    seed::{self, SeedReport},
    synth,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "simple-app")]
#[command(version)]
#[command(about = "Photo gallery infrastructure", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "simple-app.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write stack templates and the deployment manifest
    Synth {
        /// Output directory
        #[arg(short, long, default_value = "cdk.out")]
        out: PathBuf,
    },

    /// Upload local photos to the photo bucket
    SeedPhotos {
        /// Photo bucket name
        #[arg(short, long)]
        bucket: String,

        /// Photo directory, defaults to `photos.seed_dir`
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Upload the frontend bundle and its config to the website bucket
    SeedWebsite {
        /// Website bucket name
        #[arg(short, long)]
        bucket: String,

        /// Base URL of the deployed HTTP API
        #[arg(short, long)]
        api_url: String,

        /// Bundle directory, defaults to `website.build_dir`
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Distribution serving the bucket, invalidated when files changed
        #[arg(short, long)]
        distribution_id: Option<String>,
    },
}

async fn aws_config(config: &AppConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await
}

fn print_report(bucket: &str, report: SeedReport) {
    println!(
        "s3://{bucket}: {} uploaded, {} unchanged",
        report.uploaded, report.unchanged
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        info!("No config file found, using defaults");
        AppConfig::default()
    };

    match cli.command {
        Commands::Synth { out } => {
            let stacks = synth::synthesize(&config)?;
            for path in synth::write_templates(&stacks, &config.region, &out)? {
                println!("{}", path.display());
            }
        }

        Commands::SeedPhotos { bucket, source } => {
            let dir = source.unwrap_or_else(|| config.photos.seed_dir.clone());
            let client = S3Client::new(&aws_config(&config).await);
            let report = seed::seed_directory(&client, &bucket, &dir).await?;
            print_report(&bucket, report);
        }

        Commands::SeedWebsite {
            bucket,
            api_url,
            source,
            distribution_id,
        } => {
            let dir = source.unwrap_or_else(|| config.website.build_dir.clone());
            let sdk_config = aws_config(&config).await;
            let client = S3Client::new(&sdk_config);
            let report = seed::seed_website(&client, &bucket, &dir, &api_url).await?;
            print_report(&bucket, report);

            match distribution_id {
                Some(_) if report.uploaded == 0 => {
                    info!("Website unchanged, cache invalidation not needed");
                }
                Some(id) => {
                    let cloudfront = CloudFrontClient::new(&sdk_config);
                    let invalidation_id = invalidation::invalidate_all(&cloudfront, &id).await?;
                    println!("invalidation {invalidation_id} created for distribution {id}");
                }
                None => {
                    warn!("No --distribution-id given, cached files stay until their TTL expires");
                }
            }
        }
    }

    Ok(())
}
