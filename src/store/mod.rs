//! Object store module
//!
//! One seam between the upload handler and the remote store: a single
//! "put these bytes under this key" operation. The production
//! implementation lives in [`s3`]; tests substitute their own.

use bytes::Bytes;
use thiserror::Error;

pub mod s3;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Put failed: {0}")]
    PutError(String),
}

/// Result of a successful put
#[derive(Debug, Clone)]
pub struct PutReceipt {
    pub etag: Option<String>,
    pub bytes_written: u64,
}

/// Object store trait
///
/// A replace-or-create put of one object. Errors surface verbatim; no
/// retry or classification happens at this layer.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key` with the given content type
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError>;
}
