//! Integration tests for the s3proxy server.
//!
//! These tests require an S3-compatible endpoint and a running s3proxy server
//! that serves the test bucket with an empty root:
//!
//! ```text
//! S3PROXY_BUCKET=s3proxy-test S3PROXY_ENDPOINT=http://localhost:4566 \
//!     S3PROXY_REGION=us-east-1 s3proxy-server
//! ```
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p s3proxy-integration -- --ignored
//! ```

use std::sync::Once;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL of the S3-compatible backend.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Base URL of the proxy.
fn proxy_base_url() -> String {
    std::env::var("S3PROXY_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// Bucket the proxy serves.
#[must_use]
pub fn test_bucket() -> String {
    std::env::var("S3PROXY_TEST_BUCKET").unwrap_or_else(|_| "s3proxy-test".to_owned())
}

/// Full proxy URL for `path_and_query`.
#[must_use]
pub fn proxy_url(path_and_query: &str) -> String {
    format!("{}{path_and_query}", proxy_base_url())
}

/// Create a configured S3 client pointing at the backend.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// HTTP client for talking to the proxy.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Generate a unique key prefix for a test.
#[must_use]
pub fn test_prefix(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("test-{prefix}-{id}")
}

/// Create the test bucket if it does not exist yet.
pub async fn ensure_bucket(client: &aws_sdk_s3::Client) -> String {
    let bucket = test_bucket();
    if client.head_bucket().bucket(&bucket).send().await.is_err() {
        client
            .create_bucket()
            .bucket(&bucket)
            .send()
            .await
            .unwrap_or_else(|e| panic!("failed to create bucket {bucket}: {e}"));
    }
    bucket
}

/// Upload `body` under `key`, with an optional content type and user metadata.
pub async fn put_object(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: &'static [u8],
    content_type: Option<&str>,
    metadata: &[(&str, &str)],
) {
    let mut req = client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from_static(body))
        .set_content_type(content_type.map(ToOwned::to_owned));
    for (name, value) in metadata {
        req = req.metadata(*name, *value);
    }
    req.send()
        .await
        .unwrap_or_else(|e| panic!("failed to put {key}: {e}"));
}

/// Delete every object under `prefix`.
pub async fn cleanup_prefix(client: &aws_sdk_s3::Client, bucket: &str, prefix: &str) {
    let Ok(resp) = client
        .list_objects_v2()
        .bucket(bucket)
        .prefix(prefix)
        .send()
        .await
    else {
        return;
    };

    for obj in resp.contents() {
        if let Some(key) = obj.key() {
            let _ = client.delete_object().bucket(bucket).key(key).send().await;
        }
    }
}

/// Lowercase hex SHA-1 of a raw query string, the key segment of a query variant.
#[must_use]
pub fn query_digest(raw_query: &str) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(raw_query.as_bytes()))
}

mod test_conditional;
mod test_delegate;
mod test_object;
