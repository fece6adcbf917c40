//! Read-only view of an inbound request.

use http::HeaderMap;
use percent_encoding::percent_decode_str;

/// The parts of an inbound request the proxy works from.
///
/// Built once per request. The path is percent-decoded; the query string is
/// kept exactly as received, since its raw bytes address the object variant.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Request method.
    pub method: http::Method,
    /// Percent-decoded URL path.
    pub path: String,
    /// Raw, undecoded query string without the leading `?`.
    pub raw_query: String,
    /// Host the request was addressed to, without port, if known.
    pub host: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Capture the context of a request.
    #[must_use]
    pub fn from_request<B>(req: &http::Request<B>) -> Self {
        let uri = req.uri();
        Self {
            method: req.method().clone(),
            path: decode_path(uri.path()),
            raw_query: uri.query().unwrap_or_default().to_owned(),
            host: request_host(req),
            headers: req.headers().clone(),
        }
    }

    /// Returns `true` for `GET` requests, the only method served from storage.
    #[must_use]
    pub fn is_get(&self) -> bool {
        self.method == http::Method::GET
    }
}

/// Percent-decode a URL path. Invalid UTF-8 sequences are replaced.
fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Host from the URI authority, else the `Host` header, with any port removed.
fn request_host<B>(req: &http::Request<B>) -> Option<String> {
    if let Some(host) = req.uri().host() {
        return Some(host.to_owned());
    }
    let value = req.headers().get(http::header::HOST)?.to_str().ok()?;
    let authority: http::uri::Authority = value.parse().ok()?;
    Some(authority.host().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_capture_path_and_raw_query() {
        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri("/images/logo.png?v=2&size=a%20b")
            .body(())
            .expect("valid request");
        let ctx = RequestContext::from_request(&req);
        assert!(ctx.is_get());
        assert_eq!(ctx.path, "/images/logo.png");
        assert_eq!(ctx.raw_query, "v=2&size=a%20b");
    }

    #[test]
    fn test_should_decode_percent_encoded_path() {
        let req = http::Request::builder()
            .uri("/my%20file%2Btest.txt")
            .body(())
            .expect("valid request");
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.path, "/my file+test.txt");
        assert!(ctx.raw_query.is_empty());
    }

    #[test]
    fn test_should_read_host_without_port() {
        let req = http::Request::builder()
            .uri("/")
            .header("Host", "example.com:8080")
            .body(())
            .expect("valid request");
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.host.as_deref(), Some("example.com"));

        let req = http::Request::builder()
            .uri("http://cdn.example.com/a")
            .body(())
            .expect("valid request");
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.host.as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn test_should_flag_non_get_methods() {
        let req = http::Request::builder()
            .method(http::Method::PUT)
            .uri("/a")
            .body(())
            .expect("valid request");
        assert!(!RequestContext::from_request(&req).is_get());
    }
}
