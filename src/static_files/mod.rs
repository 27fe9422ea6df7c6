//! Static file serving
//!
//! Serves the configured root directory for non-upload requests, the way
//! the original served its upload page next to the endpoint. Read-only and
//! independent of upload traffic.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Static file errors
#[derive(Error, Debug)]
pub enum StaticFileError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Static file server rooted at one directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    /// Create a server rooted at `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a request path to a file inside the root.
    ///
    /// Percent-decodes the path and rejects anything that would escape
    /// the root (`..`, absolute components, NUL bytes).
    fn resolve(&self, request_path: &str) -> Result<PathBuf, StaticFileError> {
        let decoded = percent_decode_str(request_path)
            .decode_utf8()
            .map_err(|_| StaticFileError::InvalidPath("not valid UTF-8".into()))?;

        if decoded.contains('\0') {
            return Err(StaticFileError::InvalidPath("NUL byte in path".into()));
        }

        let relative = decoded.trim_start_matches('/');
        let mut resolved = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(StaticFileError::InvalidPath(
                        "path escapes static root".into(),
                    ))
                }
            }
        }

        Ok(resolved)
    }

    /// Serve a file, mapping every failure to an HTTP response.
    ///
    /// `include_body` is false for HEAD requests.
    pub async fn serve(&self, request_path: &str, include_body: bool) -> Response<Full<Bytes>> {
        let file_path = match self.resolve(request_path) {
            Ok(path) => path,
            Err(e) => {
                tracing::info!(path = %request_path, error = %e, "Rejected static path");
                return error_response(StatusCode::BAD_REQUEST, "Invalid path");
            }
        };

        let contents = match tokio::fs::read(&file_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return error_response(StatusCode::NOT_FOUND, "Not found");
            }
            Err(e) => {
                tracing::warn!(path = %file_path.display(), error = %e, "Static read failed");
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Read failed");
            }
        };

        // HEAD drops the body but still advertises the file size
        let length = contents.len();
        let body = if include_body {
            Bytes::from(contents)
        } else {
            Bytes::new()
        };

        // Response construction with static headers cannot fail
        Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", content_type_for(&file_path).to_string())
            .header("Content-Length", length)
            .body(Full::new(body))
            .unwrap()
    }
}

/// Map a file extension to a content type
fn content_type_for(path: &Path) -> mime::Mime {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS,
        Some("js") => mime::APPLICATION_JAVASCRIPT,
        Some("json") => mime::APPLICATION_JSON,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(format!(
            "{{\"message\":\"{}\"}}",
            message
        ))))
        .unwrap()
}
