//! Upload Handler Integration Tests
//!
//! Exercises the full request contract of the upload handler against a
//! recording store: missing field, success path, store failure, key
//! uniqueness, and the pinned-clock scenario.

use bytes::Bytes;
use hyper::StatusCode;
use picrelay::store::{ObjectStore, PutReceipt, StoreError};
use picrelay::upload::UploadHandler;
use std::sync::{Arc, Mutex};

const BOUNDARY: &str = "picrelay-test-boundary";
const MAX_UPLOAD: usize = 25 * 1024 * 1024;

/// One recorded put call
#[derive(Debug, Clone)]
struct PutCall {
    key: String,
    body: Bytes,
    content_type: String,
}

/// Store double that records calls and optionally fails every put
struct RecordingStore {
    calls: Mutex<Vec<PutCall>>,
    fail_with: Option<String>,
}

impl RecordingStore {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_with: None,
        })
    }

    fn failing(detail: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(detail.to_string()),
        })
    }

    fn calls(&self) -> Vec<PutCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ObjectStore for RecordingStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<PutReceipt, StoreError> {
        let bytes_written = body.len() as u64;
        self.calls.lock().unwrap().push(PutCall {
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });

        match &self.fail_with {
            Some(detail) => Err(StoreError::PutError(detail.clone())),
            None => Ok(PutReceipt {
                etag: Some("\"d41d8cd98f00b204e9800998ecf8427e\"".into()),
                bytes_written,
            }),
        }
    }
}

fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

fn photo_form(filename: &str, payload: &[u8]) -> Bytes {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; \
             name=\"photo\"; filename=\"{filename}\"\r\n\
             Content-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Bytes::from(body)
}

fn form_without_photo() -> Bytes {
    Bytes::from(format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; \
         name=\"caption\"\r\n\r\nmy cat\r\n--{BOUNDARY}--\r\n"
    ))
}

/// Missing `photo` field: 400 with the exact body, store never invoked
#[tokio::test]
async fn test_missing_file_is_400_and_store_untouched() {
    let store = RecordingStore::succeeding();
    let handler = UploadHandler::new(store.clone(), MAX_UPLOAD);

    let response = handler
        .handle(Some(&multipart_content_type()), form_without_photo())
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, r#"{"message":"No file uploaded"}"#);
    assert!(store.calls().is_empty());
}

/// Success path: 200, time-stamped key, one put with the exact bytes
#[tokio::test]
async fn test_success_key_and_payload() {
    let store = RecordingStore::succeeding();
    let handler = UploadHandler::new(store.clone(), MAX_UPLOAD);

    let payload = b"\x89PNG\r\n\x1a\nxxxx";
    let response = handler
        .handle(
            Some(&multipart_content_type()),
            photo_form("cat.png", payload),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["message"], "Photo uploaded successfully!");

    let file_name = body["fileName"].as_str().unwrap();
    let pattern = regex_lite::Regex::new(r"^\d+_cat\.png$").unwrap();
    assert!(pattern.is_match(file_name), "unexpected key: {file_name}");

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].key, file_name);
    assert_eq!(calls[0].content_type, "image/png");
    assert_eq!(calls[0].body.as_ref(), payload);
}

/// Store failure: 500 with the error detail, exactly one put (no retry)
#[tokio::test]
async fn test_store_failure_is_500_without_retry() {
    let store = RecordingStore::failing("bucket is on fire");
    let handler = UploadHandler::new(store.clone(), MAX_UPLOAD);

    let response = handler
        .handle(
            Some(&multipart_content_type()),
            photo_form("cat.png", b"bytes"),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["message"], "Failed to upload photo");
    assert_eq!(body["error"]["code"], "store_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("bucket is on fire"));

    assert_eq!(store.calls().len(), 1);
}

/// Distinct millis produce distinct keys for the same filename
#[tokio::test]
async fn test_keys_differ_across_millis() {
    fn first_millis() -> i64 {
        1700000000000
    }
    fn second_millis() -> i64 {
        1700000000001
    }

    let store = RecordingStore::succeeding();
    let first = UploadHandler::with_clock(store.clone(), MAX_UPLOAD, first_millis);
    let second = UploadHandler::with_clock(store.clone(), MAX_UPLOAD, second_millis);

    first
        .handle(
            Some(&multipart_content_type()),
            photo_form("cat.png", b"one"),
        )
        .await;
    second
        .handle(
            Some(&multipart_content_type()),
            photo_form("cat.png", b"two"),
        )
        .await;

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert_ne!(calls[0].key, calls[1].key);
}

/// Pinned clock scenario: 10 bytes named a.png at 1700000000000
#[tokio::test]
async fn test_pinned_clock_scenario() {
    fn pinned_millis() -> i64 {
        1700000000000
    }

    let store = RecordingStore::succeeding();
    let handler = UploadHandler::with_clock(store.clone(), MAX_UPLOAD, pinned_millis);

    let response = handler
        .handle(
            Some(&multipart_content_type()),
            photo_form("a.png", b"0123456789"),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        r#"{"message":"Photo uploaded successfully!","fileName":"1700000000000_a.png"}"#
    );

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].key, "1700000000000_a.png");
    assert_eq!(calls[0].content_type, "image/png");
    assert_eq!(calls[0].body.len(), 10);
}

/// The stored content type stays image/png even for a JPEG upload
#[tokio::test]
async fn test_content_type_fixed_regardless_of_upload() {
    let store = RecordingStore::succeeding();
    let handler = UploadHandler::new(store.clone(), MAX_UPLOAD);

    handler
        .handle(
            Some(&multipart_content_type()),
            photo_form("holiday.jpg", b"\xff\xd8\xff\xe0jpeg"),
        )
        .await;

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].content_type, "image/png");
}

/// Oversized uploads are rejected before any store call
#[tokio::test]
async fn test_oversized_upload_never_reaches_store() {
    let store = RecordingStore::succeeding();
    let handler = UploadHandler::new(store.clone(), 1024);

    let response = handler
        .handle(
            Some(&multipart_content_type()),
            photo_form("big.png", &vec![0u8; 4096]),
        )
        .await;

    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(body["error"]["code"], "payload_too_large");
    assert!(store.calls().is_empty());
}
