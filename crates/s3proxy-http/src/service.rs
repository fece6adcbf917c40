//! The proxy HTTP service implementing hyper's `Service` trait.
//!
//! [`S3ProxyService`] runs one state machine per request:
//!
//! 1. Non-`GET` requests go straight to the next handler, without any storage
//!    call.
//! 2. The root template is resolved and the object key is built.
//! 3. Conditional headers are captured and a single fetch is issued.
//! 4. A hit is rebuilt into a `200` response, a satisfied validator becomes a
//!    bare `304`, and everything else is delegated to the next handler.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::service::Service;
use s3proxy_core::{
    ConditionalParams, FetchOutcome, ObjectStore, ProxyConfig, build_key, fetch_object,
};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::body::ProxyResponseBody;
use crate::next::NextHandler;
use crate::replacer::{Replacer, VarsReplacer};
use crate::request::RequestContext;
use crate::response::reconstruct;

/// The proxy service.
///
/// # Type Parameters
///
/// - `S`: the storage backend implementing [`ObjectStore`].
/// - `N`: the handler requests are delegated to.
pub struct S3ProxyService<S, N> {
    store: Arc<S>,
    next: Arc<N>,
    replacer: Arc<dyn Replacer>,
    config: Arc<ProxyConfig>,
}

impl<S, N> std::fmt::Debug for S3ProxyService<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ProxyService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ObjectStore, N> S3ProxyService<S, N> {
    /// Create a service resolving `{http.vars.*}` from `config.vars`.
    #[must_use]
    pub fn new(store: S, next: N, config: ProxyConfig) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(next), config)
    }

    /// Create a service from shared store and next handler.
    #[must_use]
    pub fn from_shared(store: Arc<S>, next: Arc<N>, config: ProxyConfig) -> Self {
        let replacer = Arc::new(VarsReplacer::new(config.vars.clone()));
        Self {
            store,
            next,
            replacer,
            config: Arc::new(config),
        }
    }

    /// Replace the placeholder resolver.
    #[must_use]
    pub fn with_replacer(mut self, replacer: impl Replacer) -> Self {
        self.replacer = Arc::new(replacer);
        self
    }

    /// The configuration this service runs with.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

impl<S, N> Clone for S3ProxyService<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            next: Arc::clone(&self.next),
            replacer: Arc::clone(&self.replacer),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, N, B> Service<http::Request<B>> for S3ProxyService<S, N>
where
    S: ObjectStore,
    N: NextHandler<B>,
    B: Send + 'static,
{
    type Response = http::Response<ProxyResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let this = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let span = info_span!("request", %request_id);
            Ok(this.process_request(req).instrument(span).await)
        })
    }
}

impl<S, N> S3ProxyService<S, N>
where
    S: ObjectStore,
{
    async fn process_request<B>(&self, req: http::Request<B>) -> http::Response<ProxyResponseBody>
    where
        N: NextHandler<B>,
        B: Send + 'static,
    {
        let ctx = RequestContext::from_request(&req);
        debug!(
            method = %ctx.method,
            path = %ctx.path,
            query = %ctx.raw_query,
            "incoming request"
        );

        if !ctx.is_get() {
            debug!(method = %ctx.method, error = "method not allowed", "cache:miss");
            return self.delegate(req).await;
        }

        let root = self.replacer.replace_all(&self.config.root, &ctx);
        let key = build_key(&root, &ctx.path, &ctx.raw_query, &self.config.index_document);
        let conditionals = ConditionalParams::from_headers(&ctx.headers);

        match fetch_object(self.store.as_ref(), &self.config.bucket, &key, conditionals).await {
            FetchOutcome::NotModified => not_modified_response(),
            FetchOutcome::Hit(object) => match reconstruct(&key, object).await {
                Ok(response) => response,
                Err(err) => {
                    debug!(key = %key, error = %err, "delegating after failed reconstruction");
                    self.delegate(req).await
                }
            },
            FetchOutcome::Miss { .. } | FetchOutcome::Failure(_) => self.delegate(req).await,
        }
    }

    async fn delegate<B>(&self, req: http::Request<B>) -> http::Response<ProxyResponseBody>
    where
        N: NextHandler<B>,
    {
        NextHandler::call(self.next.as_ref(), req).await
    }
}

/// A `304 Not Modified` with no headers and no body.
fn not_modified_response() -> http::Response<ProxyResponseBody> {
    let mut response = http::Response::new(ProxyResponseBody::empty());
    *response.status_mut() = http::StatusCode::NOT_MODIFIED;
    response
}
