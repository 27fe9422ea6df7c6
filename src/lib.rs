//! Picrelay Library
//!
//! Minimal photo upload relay: accepts a single multipart-form image and
//! forwards it to an S3-compatible bucket under a time-stamped key.
//!
//! # Features
//!
//! - **Single Endpoint**: `POST /upload` with one `photo` file field
//! - **Time-Stamped Keys**: objects land at `{epoch-millis}_{filename}`
//! - **S3 Compatible**: AWS S3, MinIO, or any endpoint the SDK can reach
//! - **Static Hosting**: everything else is served from a configured root
//!
//! # Example
//!
//! ```no_run
//! use picrelay::{config::Config, server::Server, store::s3::S3Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let store = Arc::new(S3Store::from_config(&config.s3).await);
//!     let server = Server::new(config, store)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod metrics;
pub mod router;
pub mod server;
pub mod static_files;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use server::Server;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
