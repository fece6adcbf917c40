//! The next handler in the chain.
//!
//! Requests the proxy declines (non-GET methods, misses, backend failures) are
//! handed over untouched to a [`NextHandler`], which produces the response
//! instead.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::body::ProxyResponseBody;

/// Boxed future returned by [`NextHandler::call`].
pub type NextFuture = Pin<Box<dyn Future<Output = http::Response<ProxyResponseBody>> + Send>>;

/// Handler that serves requests the proxy does not.
pub trait NextHandler<B>: Send + Sync + 'static {
    /// Handle the request and produce a response.
    fn call(&self, req: http::Request<B>) -> NextFuture;
}

impl<B, N: NextHandler<B> + ?Sized> NextHandler<B> for Arc<N> {
    fn call(&self, req: http::Request<B>) -> NextFuture {
        (**self).call(req)
    }
}

/// Next handler that answers every request with `404 Not Found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundHandler;

impl<B> NextHandler<B> for NotFoundHandler {
    fn call(&self, _req: http::Request<B>) -> NextFuture {
        Box::pin(async {
            let mut response = http::Response::new(ProxyResponseBody::empty());
            *response.status_mut() = http::StatusCode::NOT_FOUND;
            response
        })
    }
}
