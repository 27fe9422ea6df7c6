//! Multipart form parsing
//!
//! Pulls the single `photo` file field out of a `multipart/form-data` body
//! that has already been collected into memory. Only fields carrying a
//! filename count as files; a plain text field named `photo` does not.

use super::PHOTO_FIELD;
use bytes::Bytes;
use std::convert::Infallible;

/// The extracted photo: original filename plus the raw bytes
#[derive(Debug, Clone)]
pub struct PhotoField {
    pub filename: String,
    pub data: Bytes,
}

/// Extract the boundary from a Content-Type header value
pub fn boundary(content_type: &str) -> Result<String, multer::Error> {
    multer::parse_boundary(content_type)
}

/// Scan the form for the first `photo` file field.
///
/// Returns `Ok(None)` when the form parses but carries no such field;
/// errors only on a malformed body.
pub async fn extract_photo(
    boundary: String,
    body: Bytes,
) -> Result<Option<PhotoField>, multer::Error> {
    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            // Text field, not a file upload
            None => continue,
        };

        let data = field.bytes().await?;
        return Ok(Some(PhotoField { filename, data }));
    }

    Ok(None)
}
