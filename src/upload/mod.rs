//! Upload module
//!
//! Parses the multipart upload request, derives the storage key and drives
//! the single put call against the object store.

use hyper::StatusCode;
use serde::Serialize;

pub mod handler;
pub mod multipart;

pub use handler::UploadHandler;

/// Form field the photo must arrive in
pub const PHOTO_FIELD: &str = "photo";

/// Content type recorded on every stored object.
///
/// Fixed regardless of what was actually uploaded; a JPEG still lands as
/// `image/png`. Kept from the original behavior.
pub const STORED_CONTENT_TYPE: &str = "image/png";

/// Derive the storage key for an upload.
///
/// Format is `{epoch-millis}_{original-filename}`. Uniqueness is
/// probabilistic: two same-named files in the same millisecond collide and
/// the later one wins. No suffix is added so previously stored keys stay
/// compatible.
pub fn storage_key(millis: i64, filename: &str) -> String {
    format!("{}_{}", millis, filename)
}

/// Body of the 200 response
#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

/// Stable error detail embedded in failure responses
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Body of a failure response
#[derive(Debug, Serialize)]
pub struct UploadRejected {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

/// Outcome of one upload request, ready to be written out as HTTP
#[derive(Debug)]
pub struct UploadResponse {
    pub status: StatusCode,
    pub body: String,
}

impl UploadResponse {
    fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        Self {
            status,
            // Serialization of these response structs cannot fail
            body: serde_json::to_string(body).unwrap_or_default(),
        }
    }

    pub(crate) fn accepted(file_name: String) -> Self {
        Self::json(
            StatusCode::OK,
            &UploadAccepted {
                message: "Photo uploaded successfully!".into(),
                file_name,
            },
        )
    }

    pub(crate) fn no_file() -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            &UploadRejected {
                message: "No file uploaded".into(),
                error: None,
            },
        )
    }

    pub(crate) fn bad_multipart(detail: String) -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            &UploadRejected {
                message: "Invalid upload request".into(),
                error: Some(ErrorDetail {
                    code: "bad_multipart",
                    message: detail,
                }),
            },
        )
    }

    pub(crate) fn too_large(limit: usize) -> Self {
        Self::json(
            StatusCode::PAYLOAD_TOO_LARGE,
            &UploadRejected {
                message: "Photo too large".into(),
                error: Some(ErrorDetail {
                    code: "payload_too_large",
                    message: format!("Upload exceeds the {} byte limit", limit),
                }),
            },
        )
    }

    pub(crate) fn store_failed(detail: String) -> Self {
        Self::json(
            StatusCode::INTERNAL_SERVER_ERROR,
            &UploadRejected {
                message: "Failed to upload photo".into(),
                error: Some(ErrorDetail {
                    code: "store_error",
                    message: detail,
                }),
            },
        )
    }
}
