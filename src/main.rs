//! Picrelay - Minimal photo upload relay
//!
//! Accepts a multipart photo upload and forwards it to an S3 bucket.

use clap::Parser;
use picrelay::{config::Config, server::Server, store::s3::S3Store};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Picrelay - photo upload relay to S3
#[derive(Parser, Debug)]
#[command(name = "picrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; falls back to environment variables
    /// (AWS_REGION, AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, S3_BUCKET_NAME)
    /// when the file does not exist
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Picrelay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = if args.config.exists() {
        let config = Config::load(&args.config)?;
        info!("Loaded configuration from {:?}", args.config);
        config
    } else {
        let config = Config::from_env()?;
        info!("No config file at {:?}, using environment variables", args.config);
        config
    };

    // Build the storage adapter once; shared read-only across requests
    let store = Arc::new(S3Store::from_config(&config.s3).await);

    // Start server
    let server = Server::new(config, store)?;
    server.run().await?;

    Ok(())
}
