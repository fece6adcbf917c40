//! Object fetching and outcome classification.
//!
//! [`fetch_object`] performs exactly one `GetObject` call and folds the result
//! into a [`FetchOutcome`]. Backend error codes are decoded here and nowhere
//! else.

use tracing::{debug, error};

use crate::conditional::ConditionalParams;
use crate::error::{ProxyError, StorageError};
use crate::storage::{GetObjectRequest, ObjectResponse, ObjectStore};

/// Classification of a [`StorageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// A conditional request was satisfied; respond with 304.
    NotModified,
    /// The key does not exist.
    NoSuchKey,
    /// Any other failure.
    Other,
}

impl StorageErrorKind {
    /// Decode a backend error.
    ///
    /// The code wins when present. A bare 304 status also means "not
    /// modified", since 304 responses carry no error document, and a bare 404
    /// means the key is missing.
    #[must_use]
    pub fn classify(err: &StorageError) -> Self {
        match (err.code.as_str(), err.status) {
            ("NotModified", _) | ("", Some(304)) => Self::NotModified,
            ("NoSuchKey", _) | ("", Some(404)) => Self::NoSuchKey,
            _ => Self::Other,
        }
    }
}

/// Result of a single fetch attempt.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The object was retrieved.
    Hit(ObjectResponse),
    /// The client's cached copy is current.
    NotModified,
    /// The object does not exist. This is a normal negative lookup.
    Miss {
        /// Backend message describing the miss.
        reason: String,
    },
    /// The fetch failed.
    Failure(ProxyError),
}

impl FetchOutcome {
    /// Returns `true` for [`FetchOutcome::Hit`].
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Fetch `key` from `bucket`, forwarding `conditionals`.
///
/// A successful response that reports a content length of zero is treated as a
/// failure: an empty object counts as a misconfigured backend entry, not as
/// content to serve.
pub async fn fetch_object<S: ObjectStore + ?Sized>(
    store: &S,
    bucket: &str,
    key: &str,
    conditionals: ConditionalParams,
) -> FetchOutcome {
    debug!(bucket, key, "cache:attempt");

    let request = GetObjectRequest {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        conditionals,
    };

    let response = match store.get_object(request).await {
        Ok(response) => response,
        Err(err) => return classify_error(bucket, key, err),
    };

    if response.content_length == Some(0) {
        error!(bucket, key, error = "ContentLength is empty", "cache:fail");
        return FetchOutcome::Failure(ProxyError::EmptyBody {
            key: key.to_owned(),
        });
    }

    debug!(bucket, key, "cache:hit");
    FetchOutcome::Hit(response)
}

fn classify_error(bucket: &str, key: &str, err: StorageError) -> FetchOutcome {
    match StorageErrorKind::classify(&err) {
        StorageErrorKind::NotModified => {
            debug!(bucket, key, code = %err.code, "cache:hit");
            FetchOutcome::NotModified
        }
        StorageErrorKind::NoSuchKey => {
            debug!(bucket, key, code = %err.code, error = %err.message, "cache:miss");
            FetchOutcome::Miss {
                reason: err.message,
            }
        }
        StorageErrorKind::Other => {
            error!(
                bucket,
                key,
                code = %err.code,
                status = ?err.status,
                error = %err.message,
                "cache:fail"
            );
            FetchOutcome::Failure(err.into())
        }
    }
}
