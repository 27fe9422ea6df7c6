//! Upload handler
//!
//! Orchestrates one upload request: size check, multipart parse, key
//! derivation, one store call, response mapping. Each invocation is an
//! independent stateless transaction; nothing is retried.
//!
//! # Example
//!
//! ```no_run
//! use picrelay::config::S3Config;
//! use picrelay::store::s3::S3Store;
//! use picrelay::upload::UploadHandler;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let s3_config = S3Config {
//! #     bucket: "photos".into(),
//! #     region: "us-east-1".into(),
//! #     endpoint: None,
//! #     access_key: None,
//! #     secret_key: None,
//! # };
//! let store = Arc::new(S3Store::from_config(&s3_config).await);
//! let handler = UploadHandler::new(store, 25 * 1024 * 1024);
//! # Ok(())
//! # }
//! ```

use super::{multipart, storage_key, UploadResponse, STORED_CONTENT_TYPE};
use crate::metrics;
use crate::store::ObjectStore;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Photo upload handler
///
/// Holds the store adapter and the upload size cap; shared read-only
/// across concurrent request tasks.
pub struct UploadHandler {
    store: Arc<dyn ObjectStore>,
    max_upload_bytes: usize,
    now_millis: fn() -> i64,
}

impl UploadHandler {
    /// Create a handler using the wall clock for key timestamps
    pub fn new(store: Arc<dyn ObjectStore>, max_upload_bytes: usize) -> Self {
        Self::with_clock(store, max_upload_bytes, wall_clock_millis)
    }

    /// Create a handler with an explicit millis source.
    ///
    /// Lets tests pin the timestamp that ends up in the storage key.
    pub fn with_clock(
        store: Arc<dyn ObjectStore>,
        max_upload_bytes: usize,
        now_millis: fn() -> i64,
    ) -> Self {
        Self {
            store,
            max_upload_bytes,
            now_millis,
        }
    }

    /// Handle one upload request.
    ///
    /// `content_type` is the request's Content-Type header, `body` the
    /// fully collected request body. Every outcome maps to a JSON
    /// response; nothing escapes as an error.
    #[tracing::instrument(name = "upload.handle", skip(self, body), fields(upload.bytes = body.len()))]
    pub async fn handle(&self, content_type: Option<&str>, body: Bytes) -> UploadResponse {
        if body.len() > self.max_upload_bytes {
            tracing::info!(
                bytes = body.len(),
                limit = self.max_upload_bytes,
                "Rejected oversized upload"
            );
            metrics::record_error("payload_too_large");
            return UploadResponse::too_large(self.max_upload_bytes);
        }

        let boundary = match content_type.map(multipart::boundary) {
            Some(Ok(boundary)) => boundary,
            Some(Err(e)) => {
                tracing::info!(error = %e, "Upload without usable multipart boundary");
                return UploadResponse::bad_multipart(e.to_string());
            }
            None => {
                tracing::info!("Upload without Content-Type header");
                return UploadResponse::bad_multipart("missing Content-Type header".into());
            }
        };

        let photo = match multipart::extract_photo(boundary, body).await {
            Ok(Some(photo)) => photo,
            Ok(None) => {
                // Client forgot the file; informational, not an error
                tracing::info!("Upload request without a photo field");
                return UploadResponse::no_file();
            }
            Err(e) => {
                tracing::info!(error = %e, "Malformed multipart body");
                return UploadResponse::bad_multipart(e.to_string());
            }
        };

        let key = storage_key((self.now_millis)(), &photo.filename);
        let bytes_written = photo.data.len() as u64;
        let start_time = Instant::now();

        let result = self
            .store
            .put(&key, photo.data, STORED_CONTENT_TYPE)
            .await;

        let duration = start_time.elapsed();
        metrics::record_upload_duration(duration.as_secs_f64());

        match result {
            Ok(receipt) => {
                metrics::record_upload_success(bytes_written);

                tracing::info!(
                    key = %key,
                    etag = ?receipt.etag,
                    bytes = bytes_written,
                    duration_ms = duration.as_millis(),
                    "Photo uploaded"
                );

                UploadResponse::accepted(key)
            }
            Err(e) => {
                metrics::record_upload_failure();
                metrics::record_error("store_put");

                tracing::error!(
                    key = %key,
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Photo upload failed"
                );

                UploadResponse::store_failed(e.to_string())
            }
        }
    }
}
