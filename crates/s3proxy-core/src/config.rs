//! Proxy configuration.
//!
//! [`ProxyConfig`] is loaded once, provisioned, and then shared read-only by
//! every request. Values come from environment variables or a JSON document
//! using the same keys as the handler's JSON configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;
use crate::key::DEFAULT_INDEX_DOCUMENT;

/// Root template used when none is configured.
pub const DEFAULT_ROOT: &str = "{http.vars.root}";

/// Prefix of environment variables that define `{http.vars.*}` values.
const VAR_ENV_PREFIX: &str = "S3PROXY_VAR_";

/// s3proxy configuration.
///
/// # Examples
///
/// ```
/// use s3proxy_core::config::ProxyConfig;
///
/// let config = ProxyConfig::builder()
///     .bucket("my-site".to_owned())
///     .build()
///     .provision()
///     .expect("valid config");
/// assert_eq!(config.root, "{http.vars.root}");
/// assert_eq!(config.index_document, "index.html");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct ProxyConfig {
    /// Root path template, joined in front of every request path. May contain
    /// placeholders such as `{http.vars.root}`.
    #[builder(default = String::from(DEFAULT_ROOT))]
    pub root: String,

    /// Name of the bucket objects are read from.
    #[builder(default)]
    pub bucket: String,

    /// AWS region of the bucket. Falls back to the SDK's region chain.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Non-standard S3 endpoint URL.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Whether to use S3 Transfer Acceleration.
    #[builder(default = false)]
    pub use_accelerate: bool,

    /// Document name appended to keys ending in `/`.
    #[builder(default = String::from(DEFAULT_INDEX_DOCUMENT))]
    pub index_document: String,

    /// Values for `{http.vars.<name>}` placeholders.
    #[builder(default)]
    pub vars: HashMap<String, String>,

    /// Bind address of the server (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ProxyConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3PROXY_ROOT` | `{http.vars.root}` |
    /// | `S3PROXY_BUCKET` | *(required)* |
    /// | `S3PROXY_REGION` | *(SDK default)* |
    /// | `S3PROXY_ENDPOINT` | *(SDK default)* |
    /// | `S3PROXY_USE_ACCELERATE` | `false` |
    /// | `S3PROXY_INDEX_DOCUMENT` | `index.html` |
    /// | `S3PROXY_VAR_<NAME>` | sets `{http.vars.<name>}` (name lower-cased) |
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an iterator of `(name, value)` pairs, using the
    /// same names as [`ProxyConfig::from_env`].
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();

        for (name, value) in vars {
            let value = value.into();
            match name.as_ref() {
                "S3PROXY_ROOT" => config.root = value,
                "S3PROXY_BUCKET" => config.bucket = value,
                "S3PROXY_REGION" => config.region = Some(value).filter(|v| !v.is_empty()),
                "S3PROXY_ENDPOINT" => config.endpoint = Some(value).filter(|v| !v.is_empty()),
                "S3PROXY_USE_ACCELERATE" => config.use_accelerate = parse_bool(&value),
                "S3PROXY_INDEX_DOCUMENT" => config.index_document = value,
                "GATEWAY_LISTEN" => config.gateway_listen = value,
                "LOG_LEVEL" => config.log_level = value,
                other => {
                    if let Some(var) = other.strip_prefix(VAR_ENV_PREFIX) {
                        config.vars.insert(var.to_ascii_lowercase(), value);
                    }
                }
            }
        }

        config
    }

    /// Parse a JSON configuration document. Missing keys take their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&document)
    }

    /// Apply provisioning defaults and validate.
    ///
    /// An empty root becomes [`DEFAULT_ROOT`]. The bucket must be set, and the
    /// index document must be a single non-empty key segment.
    pub fn provision(mut self) -> Result<Self, ConfigError> {
        if self.root.is_empty() {
            DEFAULT_ROOT.clone_into(&mut self.root);
        }
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        if self.index_document.is_empty() || self.index_document.contains('/') {
            return Err(ConfigError::InvalidIndexDocument(self.index_document));
        }
        Ok(self)
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
