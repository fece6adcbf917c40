//! Error types for s3proxy.
//!
//! - [`ConfigError`]: invalid or unreadable configuration.
//! - [`StorageError`]: a failure reported by the storage backend, carrying the
//!   backend's raw error code. It is classified exactly once, by
//!   [`StorageErrorKind::classify`](crate::fetch::StorageErrorKind::classify).
//! - [`ProxyError`]: the reasons a request was not served, after
//!   classification.

use std::path::PathBuf;

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No bucket name was configured.
    #[error("bucket name is required")]
    MissingBucket,

    /// The default document name cannot be used as a key segment.
    #[error("invalid index document: {0:?} (must be a non-empty name without '/')")]
    InvalidIndexDocument(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON for [`ProxyConfig`](crate::ProxyConfig).
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error reported by an [`ObjectStore`](crate::ObjectStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StorageError {
    /// Backend error code, e.g. `NoSuchKey` or `NotModified`. May be empty when
    /// the backend returned no error document.
    pub code: String,
    /// HTTP status of the backend response, when there was one.
    pub status: Option<u16>,
    /// Human-readable message for diagnostics.
    pub message: String,
}

impl StorageError {
    /// Create a storage error with the given code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Attach the HTTP status of the backend response.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// The conditional request was satisfied; the object has not changed.
    #[must_use]
    pub fn not_modified() -> Self {
        Self::new("NotModified", "Not Modified").with_status(304)
    }

    /// The key does not exist in the bucket.
    #[must_use]
    pub fn no_such_key(key: &str) -> Self {
        Self::new("NoSuchKey", format!("The specified key does not exist: {key}")).with_status(404)
    }

    /// An `If-Match` or `If-Unmodified-Since` precondition failed.
    #[must_use]
    pub fn precondition_failed() -> Self {
        Self::new(
            "PreconditionFailed",
            "At least one of the pre-conditions you specified did not hold",
        )
        .with_status(412)
    }

    /// The requested range cannot be satisfied.
    #[must_use]
    pub fn invalid_range() -> Self {
        Self::new("InvalidRange", "The requested range is not satisfiable").with_status(416)
    }
}

/// Reason a request was not served from object storage.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The backend answered successfully with a zero content length.
    #[error("object {key} has an empty content length")]
    EmptyBody {
        /// Key of the degenerate object.
        key: String,
    },

    /// The backend reported a failure other than "not modified" or "no such key".
    #[error("storage backend failed with {code}: {message}")]
    Backend {
        /// Backend error code.
        code: String,
        /// Backend error message.
        message: String,
    },

    /// Reading the object body failed before the response was committed.
    #[error("failed to stream object body")]
    Streaming(#[source] std::io::Error),
}

impl From<StorageError> for ProxyError {
    fn from(err: StorageError) -> Self {
        Self::Backend {
            code: err.code,
            message: err.message,
        }
    }
}

/// Convenience result type for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
