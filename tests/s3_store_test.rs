//! S3 Store Integration Tests
//!
//! Runs the real aws-sdk-s3 wire path against a wiremock endpoint.

use bytes::Bytes;
use picrelay::config::S3Config;
use picrelay::store::{s3::S3Store, ObjectStore, StoreError};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn s3_config(endpoint: String) -> S3Config {
    S3Config {
        bucket: "test-bucket".into(),
        region: "us-east-1".into(),
        endpoint: Some(endpoint),
        access_key: Some("test-access".into()),
        secret_key: Some("test-secret".into()),
    }
}

/// Put travels as a path-style PutObject with the fixed content type
#[tokio::test]
async fn test_put_object_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/test-bucket/1700000000000_cat.png"))
        .and(header("content-type", "image/png"))
        .and(body_bytes(b"\x89PNG-payload".to_vec()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"d41d8cd98f00b204e9800998ecf8427e\""),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = S3Store::from_config(&s3_config(mock_server.uri())).await;

    let receipt = store
        .put(
            "1700000000000_cat.png",
            Bytes::from_static(b"\x89PNG-payload"),
            "image/png",
        )
        .await
        .unwrap();

    assert_eq!(
        receipt.etag.as_deref(),
        Some("\"d41d8cd98f00b204e9800998ecf8427e\"")
    );
    assert_eq!(receipt.bytes_written, 13);
}

/// A remote rejection surfaces as one PutError; no second attempt is made
#[tokio::test]
async fn test_put_failure_surfaces_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<?xml version=\"1.0\"?><Error><Code>AccessDenied</Code>\
             <Message>Access Denied</Message></Error>",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = S3Store::from_config(&s3_config(mock_server.uri())).await;

    let result = store
        .put("1700000000000_cat.png", Bytes::from_static(b"data"), "image/png")
        .await;

    match result {
        Err(StoreError::PutError(detail)) => assert!(!detail.is_empty()),
        other => panic!("Expected PutError, got {:?}", other.map(|r| r.bytes_written)),
    }
}
