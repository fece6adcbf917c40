//! Core of the s3proxy GET handler.
//!
//! This crate turns an inbound request into an object-storage lookup and
//! classifies what the storage backend answered. It has no HTTP server of its
//! own; `s3proxy-http` wires these pieces into a hyper service.
//!
//! # Architecture
//!
//! ```text
//! url path + raw query + root
//!   -> key::build_key            (object key, default document, query digest)
//! request headers
//!   -> ConditionalParams         (Range, If-* validators)
//! ObjectStore capability
//!   -> fetch::fetch_object       (Hit / NotModified / Miss / Failure)
//! ```
//!
//! The storage backend is injected through the [`ObjectStore`] trait. An
//! in-memory implementation, [`MemoryObjectStore`], lives in [`memory`].

pub mod conditional;
pub mod config;
pub mod error;
pub mod fetch;
pub mod key;
pub mod memory;
pub mod storage;

pub use conditional::ConditionalParams;
pub use config::ProxyConfig;
pub use error::{ConfigError, ProxyError, ProxyResult, StorageError};
pub use fetch::{FetchOutcome, StorageErrorKind, fetch_object};
pub use key::build_key;
pub use memory::{MemoryObjectStore, StoredObject};
pub use storage::{GetObjectRequest, ObjectBody, ObjectResponse, ObjectStore};
