//! HTTP layer of s3proxy.
//!
//! - **Request context** ([`request`]): the read-only view of an inbound
//!   request the core works from (method, decoded path, raw query, headers).
//!
//! - **Replacer** ([`replacer`]): resolves placeholders in the configured root
//!   template, once per request.
//!
//! - **Next handler** ([`next`]): the capability requests are delegated to
//!   when they are not served from object storage.
//!
//! - **Response** ([`response`]): rebuilds an HTTP response from object
//!   metadata and streams the object body.
//!
//! - **Service** ([`service`]): [`S3ProxyService`](service::S3ProxyService),
//!   the hyper `Service` that runs the per-request state machine.
//!
//! - **Body** ([`body`]): [`ProxyResponseBody`](body::ProxyResponseBody) with
//!   empty, buffered and streaming modes.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> S3ProxyService (hyper Service)
//!     -> method check              (non-GET -> next handler)
//!     -> Replacer + build_key      (object key)
//!     -> ConditionalParams         (validators)
//!     -> fetch_object              (ObjectStore capability)
//!     -> reconstruct               (headers + streamed body)
//!   <- HTTP Response, or the next handler's response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use s3proxy_core::{MemoryObjectStore, ProxyConfig};
//! use s3proxy_http::next::NotFoundHandler;
//! use s3proxy_http::service::S3ProxyService;
//!
//! let config = ProxyConfig::builder().bucket("site".to_owned()).build();
//! let store = Arc::new(MemoryObjectStore::new());
//! let service = S3ProxyService::new(store, NotFoundHandler, config);
//! // Use `service` with a hyper server.
//! ```

pub mod body;
pub mod next;
pub mod replacer;
pub mod request;
pub mod response;
pub mod service;

pub use body::ProxyResponseBody;
pub use next::{NextHandler, NotFoundHandler};
pub use replacer::{Replacer, VarsReplacer};
pub use request::RequestContext;
pub use response::{CACHE_MARKER_HEADER, reconstruct};
pub use service::S3ProxyService;
