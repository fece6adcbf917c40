//! Object key construction.
//!
//! A request is addressed to an object by joining the configured root with the
//! URL path, resolving directory-like paths to a default document, and giving
//! every distinct raw query string its own subdirectory named by the SHA-1
//! digest of the query.
//!
//! # Examples
//!
//! ```
//! use s3proxy_core::key::build_key;
//!
//! assert_eq!(build_key("/site", "/images/", "", "index.html"), "/site/images/index.html");
//! assert_eq!(
//!     build_key("/site", "/page", "a=1", "index.html"),
//!     "/site/page/86eda770a6060824b090dd4df091e3bd4121279c",
//! );
//! ```

use sha1::{Digest, Sha1};

/// Default document appended to keys that end with a separator.
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// Build the object key for a request.
///
/// The steps are applied in order:
///
/// 1. `root` and `url_path` are joined with [`join_root`], which keeps a
///    trailing separator from `url_path`.
/// 2. A key ending in `/` gets `index_document` appended.
/// 3. A non-empty `raw_query` appends the lowercase hex SHA-1 of the raw,
///    undecoded query string as a final segment.
///
/// Query strings are hashed byte for byte, so `a=1&b=2` and `b=2&a=1` address
/// different objects.
#[must_use]
pub fn build_key(root: &str, url_path: &str, raw_query: &str, index_document: &str) -> String {
    let full_path = join_root(root, url_path);

    let mut key = if full_path.ends_with('/') {
        join_path(&[&full_path, index_document])
    } else {
        full_path
    };

    if !raw_query.is_empty() {
        key = join_path(&[&key, "/", &query_digest(raw_query)]);
    }

    key
}

/// Join `root` and `url_path`, preserving a trailing separator on `url_path`.
///
/// Normalization strips trailing slashes, but a trailing slash marks a
/// directory request, so it is put back unless the joined path is `/` itself.
#[must_use]
pub fn join_root(root: &str, url_path: &str) -> String {
    let is_dir = url_path.ends_with('/');
    let joined = join_path(&[root, url_path]);
    if is_dir && joined != "/" {
        joined + "/"
    } else {
        joined
    }
}

/// Lowercase hex SHA-1 digest of a raw query string.
#[must_use]
pub fn query_digest(raw_query: &str) -> String {
    hex::encode(Sha1::digest(raw_query.as_bytes()))
}

/// Join path elements with `/` and clean the result.
///
/// Empty elements are ignored. Joining only empty elements yields an empty
/// string.
#[must_use]
pub fn join_path(elements: &[&str]) -> String {
    let parts: Vec<&str> = elements.iter().copied().filter(|e| !e.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    clean_path(&parts.join("/"))
}

/// Lexically clean a slash-separated path.
///
/// - runs of `/` collapse to one,
/// - `.` segments are dropped,
/// - `..` removes the preceding segment, and is dropped at the start of a
///   rooted path,
/// - trailing `/` is removed except for the root itself.
///
/// An empty result is returned as `.`.
#[must_use]
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }

    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_owned()
    } else {
        joined
    }
}
