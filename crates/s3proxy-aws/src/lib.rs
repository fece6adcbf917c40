//! Amazon S3 backend for s3proxy.
//!
//! [`AwsObjectStore`] implements [`ObjectStore`] on top of `aws-sdk-s3`. It is
//! created once from a provisioned [`ProxyConfig`] and shared by every request.
//! Credentials come from the SDK's default provider chain.

use std::io;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use chrono::{DateTime, Utc};
use s3proxy_core::{
    ConditionalParams, GetObjectRequest, ObjectBody, ObjectResponse, ObjectStore, ProxyConfig,
    StorageError,
};
use tracing::{debug, info};

/// Object store backed by an S3 client.
#[derive(Debug, Clone)]
pub struct AwsObjectStore {
    client: Client,
}

impl AwsObjectStore {
    /// Build the S3 client for `config`.
    ///
    /// The region falls back to the SDK's region chain when unset. A custom
    /// endpoint switches to path-style addressing.
    pub async fn provision(config: &ProxyConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .accelerate(config.use_accelerate);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        debug!(
            endpoint = ?config.endpoint,
            region = ?sdk_config.region().map(Region::as_ref),
            use_accelerate = config.use_accelerate,
            "S3 client configured"
        );
        info!(bucket = %config.bucket, "S3 proxy initialized");

        Self::from_client(Client::from_conf(builder.build()))
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn get_object(&self, request: GetObjectRequest) -> Result<ObjectResponse, StorageError> {
        let GetObjectRequest {
            bucket,
            key,
            conditionals,
        } = request;
        let ConditionalParams {
            range,
            if_match,
            if_none_match,
            if_modified_since,
            if_unmodified_since,
        } = conditionals;

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(object_key(&key))
            .set_range(range)
            .set_if_match(if_match)
            .set_if_none_match(if_none_match)
            .set_if_modified_since(if_modified_since.map(|ts| to_smithy_time(&ts)))
            .set_if_unmodified_since(if_unmodified_since.map(|ts| to_smithy_time(&ts)))
            .send()
            .await
            .map_err(|err| storage_error(&err))?;

        Ok(ObjectResponse {
            content_length: output.content_length(),
            cache_control: output.cache_control().map(str::to_owned),
            content_disposition: output.content_disposition().map(str::to_owned),
            content_encoding: output.content_encoding().map(str::to_owned),
            content_language: output.content_language().map(str::to_owned),
            content_range: output.content_range().map(str::to_owned),
            content_type: output.content_type().map(str::to_owned),
            e_tag: output.e_tag().map(str::to_owned),
            expires: output.expires_string().map(str::to_owned),
            last_modified: output.last_modified().and_then(from_smithy_time),
            metadata: output.metadata().cloned().unwrap_or_default(),
            body: Some(into_object_body(output.body)),
        })
    }
}

/// S3 keys carry no leading separator; request keys are rooted at `/`.
fn object_key(key: &str) -> &str {
    key.trim_start_matches('/')
}

fn to_smithy_time(ts: &DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs(ts.timestamp())
}

fn from_smithy_time(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

/// Adapt the SDK byte stream to an [`ObjectBody`].
fn into_object_body(stream: ByteStream) -> ObjectBody {
    Box::pin(futures::stream::unfold(stream, |mut stream| async move {
        match stream.next().await? {
            Ok(chunk) => Some((Ok(chunk), stream)),
            Err(err) => Some((Err(io::Error::other(err)), stream)),
        }
    }))
}

/// Flatten an SDK error into a [`StorageError`].
///
/// 304 responses carry no error document, so the HTTP status is kept
/// alongside the code.
fn storage_error(err: &SdkError<GetObjectError>) -> StorageError {
    let status = err.raw_response().map(|resp| resp.status().as_u16());
    let code = err.code().unwrap_or_default();
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_owned);

    let error = StorageError::new(code, message);
    match status {
        Some(status) => error.with_status(status),
        None => error,
    }
}
