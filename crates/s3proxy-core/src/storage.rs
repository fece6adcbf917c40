//! The object-storage capability.
//!
//! The proxy needs exactly one storage operation: `GetObject`. Backends
//! implement [`ObjectStore`]; the handler holds one instance for its whole
//! lifetime and shares it across requests.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::conditional::ConditionalParams;
use crate::error::StorageError;

/// Streaming object body.
pub type ObjectBody = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Wrap an in-memory buffer as a single-chunk [`ObjectBody`].
#[must_use]
pub fn body_from_bytes(data: impl Into<Bytes>) -> ObjectBody {
    let data = data.into();
    Box::pin(futures::stream::once(async move { Ok(data) }))
}

/// Input of a single `GetObject` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Validators and range forwarded from the client request.
    pub conditionals: ConditionalParams,
}

/// Successful `GetObject` result: object metadata plus its body.
#[derive(Default)]
pub struct ObjectResponse {
    /// Length of the returned body in bytes, as reported by the backend.
    pub content_length: Option<i64>,
    /// `Cache-Control` metadata.
    pub cache_control: Option<String>,
    /// `Content-Disposition` metadata.
    pub content_disposition: Option<String>,
    /// `Content-Encoding` metadata.
    pub content_encoding: Option<String>,
    /// `Content-Language` metadata.
    pub content_language: Option<String>,
    /// `Content-Range` of a ranged read.
    pub content_range: Option<String>,
    /// `Content-Type` metadata.
    pub content_type: Option<String>,
    /// Entity tag.
    pub e_tag: Option<String>,
    /// `Expires` metadata, as stored.
    pub expires: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// User-defined object metadata.
    pub metadata: HashMap<String, String>,
    /// Object body, if the backend returned one.
    pub body: Option<ObjectBody>,
}

impl fmt::Debug for ObjectResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectResponse")
            .field("content_length", &self.content_length)
            .field("cache_control", &self.cache_control)
            .field("content_disposition", &self.content_disposition)
            .field("content_encoding", &self.content_encoding)
            .field("content_language", &self.content_language)
            .field("content_range", &self.content_range)
            .field("content_type", &self.content_type)
            .field("e_tag", &self.e_tag)
            .field("expires", &self.expires)
            .field("last_modified", &self.last_modified)
            .field("metadata", &self.metadata)
            .field("body", &self.body.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Object-storage capability used by the proxy.
///
/// Implementations perform a single attempt per call; retries and timeouts,
/// if any, belong to the backend client itself.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch an object, applying the request's conditional parameters.
    ///
    /// Conditional outcomes are reported as errors, following S3: a satisfied
    /// `If-None-Match`/`If-Modified-Since` yields code `NotModified`, an absent
    /// key yields `NoSuchKey`.
    async fn get_object(&self, request: GetObjectRequest) -> Result<ObjectResponse, StorageError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn get_object(&self, request: GetObjectRequest) -> Result<ObjectResponse, StorageError> {
        (**self).get_object(request).await
    }
}
