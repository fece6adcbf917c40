//! In-memory [`ObjectStore`] implementation.
//!
//! Objects are kept per bucket in a `parking_lot` lock. `GetObject` evaluates
//! validators in RFC 7232 order and serves single byte ranges, answering with
//! the same error codes S3 uses.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, SubsecRound, Utc};
use md5::{Digest, Md5};
use parking_lot::RwLock;

use crate::conditional::ConditionalParams;
use crate::error::StorageError;
use crate::storage::{GetObjectRequest, ObjectResponse, ObjectStore, body_from_bytes};

/// An object held by [`MemoryObjectStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object content.
    pub data: Bytes,
    /// Quoted entity tag, the hex MD5 of `data` by default.
    pub e_tag: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// `Cache-Control` metadata.
    pub cache_control: Option<String>,
    /// `Content-Disposition` metadata.
    pub content_disposition: Option<String>,
    /// `Content-Encoding` metadata.
    pub content_encoding: Option<String>,
    /// `Content-Language` metadata.
    pub content_language: Option<String>,
    /// `Content-Type` metadata.
    pub content_type: Option<String>,
    /// `Expires` metadata.
    pub expires: Option<String>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
}

impl StoredObject {
    /// Create an object with the given content, modified now.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let e_tag = format!("\"{}\"", hex::encode(Md5::digest(&data)));
        Self {
            data,
            e_tag,
            last_modified: Utc::now(),
            cache_control: None,
            content_disposition: None,
            content_encoding: None,
            content_language: None,
            content_type: None,
            expires: None,
            metadata: HashMap::new(),
        }
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the cache control directive.
    #[must_use]
    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    /// Set the last modification time.
    #[must_use]
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    /// Add a user-defined metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// In-memory object store keyed by bucket, then object key.
///
/// ```
/// use s3proxy_core::{ConditionalParams, FetchOutcome, MemoryObjectStore, StoredObject, fetch_object};
///
/// # tokio_test::block_on(async {
/// let store = MemoryObjectStore::new();
/// store.put_object("site", "/index.html", StoredObject::new("hello"));
///
/// let outcome = fetch_object(&store, "site", "/index.html", ConditionalParams::default()).await;
/// assert!(outcome.is_hit());
///
/// let outcome = fetch_object(&store, "site", "/missing", ConditionalParams::default()).await;
/// assert!(matches!(outcome, FetchOutcome::Miss { .. }));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashMap<String, HashMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub fn put_object(&self, bucket: &str, key: &str, object: StoredObject) {
        self.buckets
            .write()
            .entry(bucket.to_owned())
            .or_default()
            .insert(key.to_owned(), object);
    }

    /// Remove an object, returning it if it existed.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.write().get_mut(bucket)?.remove(key)
    }

    /// Number of objects across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.read().values().map(HashMap::len).sum()
    }

    /// Returns `true` when the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.read().get(bucket)?.get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, request: GetObjectRequest) -> Result<ObjectResponse, StorageError> {
        let Some(object) = self.lookup(&request.bucket, &request.key) else {
            return Err(StorageError::no_such_key(&request.key));
        };

        check_preconditions(&object, &request.conditionals)?;

        let size = object.data.len() as u64;
        let (data, content_range) = match request.conditionals.range.as_deref() {
            Some(range) => {
                let (start, end) = parse_range_header(range, size)?;
                #[allow(clippy::cast_possible_truncation)]
                let slice = object.data.slice(start as usize..=end as usize);
                (slice, Some(format!("bytes {start}-{end}/{size}")))
            }
            None => (object.data.clone(), None),
        };

        #[allow(clippy::cast_possible_wrap)]
        let content_length = data.len() as i64;

        Ok(ObjectResponse {
            content_length: Some(content_length),
            cache_control: object.cache_control,
            content_disposition: object.content_disposition,
            content_encoding: object.content_encoding,
            content_language: object.content_language,
            content_range,
            content_type: object.content_type,
            e_tag: Some(object.e_tag),
            expires: object.expires,
            last_modified: Some(object.last_modified),
            metadata: object.metadata,
            body: Some(body_from_bytes(data)),
        })
    }
}

/// Evaluate validators against an object.
///
/// `If-Match` takes precedence over `If-Unmodified-Since`, and `If-None-Match`
/// over `If-Modified-Since`. Dates compare at one-second precision.
fn check_preconditions(
    object: &StoredObject,
    conditionals: &ConditionalParams,
) -> Result<(), StorageError> {
    let last_modified = object.last_modified.trunc_subsecs(0);

    if let Some(ref if_match) = conditionals.if_match {
        if !etag_list_matches(&object.e_tag, if_match) {
            return Err(StorageError::precondition_failed());
        }
    } else if let Some(since) = conditionals.if_unmodified_since {
        if last_modified > since {
            return Err(StorageError::precondition_failed());
        }
    }

    if let Some(ref if_none_match) = conditionals.if_none_match {
        if etag_list_matches(&object.e_tag, if_none_match) {
            return Err(StorageError::not_modified());
        }
    } else if let Some(since) = conditionals.if_modified_since {
        if last_modified <= since {
            return Err(StorageError::not_modified());
        }
    }

    Ok(())
}

/// Returns `true` if `etag` appears in a comma-separated validator list, or the
/// list is `*`. Weak prefixes are ignored.
fn etag_list_matches(etag: &str, list: &str) -> bool {
    let etag = normalize_etag(etag);
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || normalize_etag(candidate) == etag)
}

fn normalize_etag(etag: &str) -> &str {
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    etag.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(etag)
}

/// Parse a single `bytes=` range into inclusive offsets.
fn parse_range_header(range: &str, content_length: u64) -> Result<(u64, u64), StorageError> {
    let range = range
        .strip_prefix("bytes=")
        .ok_or_else(StorageError::invalid_range)?;

    if content_length == 0 {
        return Err(StorageError::invalid_range());
    }

    if let Some(suffix) = range.strip_prefix('-') {
        let n: u64 = suffix.parse().map_err(|_| StorageError::invalid_range())?;
        if n == 0 {
            return Err(StorageError::invalid_range());
        }
        Ok((content_length.saturating_sub(n), content_length - 1))
    } else if let Some(prefix) = range.strip_suffix('-') {
        let start: u64 = prefix.parse().map_err(|_| StorageError::invalid_range())?;
        if start >= content_length {
            return Err(StorageError::invalid_range());
        }
        Ok((start, content_length - 1))
    } else {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(StorageError::invalid_range)?;
        let start: u64 = start.parse().map_err(|_| StorageError::invalid_range())?;
        let end: u64 = end.parse().map_err(|_| StorageError::invalid_range())?;
        if start > end || start >= content_length {
            return Err(StorageError::invalid_range());
        }
        Ok((start, end.min(content_length - 1)))
    }
}
