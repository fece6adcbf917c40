//! Placeholder substitution for the root template.
//!
//! The configured root may reference request-scoped values such as
//! `{http.vars.root}`. It is resolved once per request, before the key is
//! built. Placeholders that cannot be resolved become the empty string.

use std::collections::HashMap;

use crate::request::RequestContext;

/// Resolves placeholders in a template string.
pub trait Replacer: Send + Sync + 'static {
    /// Replace every `{placeholder}` in `template`.
    fn replace_all(&self, template: &str, ctx: &RequestContext) -> String;
}

/// Default [`Replacer`].
///
/// | Placeholder | Value |
/// |-------------|-------|
/// | `{http.vars.<name>}` | configured variable `<name>` |
/// | `{http.request.host}` | request host, without port |
/// | `{http.request.method}` | request method |
/// | `{http.request.uri.path}` | decoded request path |
/// | `{env.<NAME>}` | process environment variable |
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use s3proxy_http::replacer::{Replacer, VarsReplacer};
/// use s3proxy_http::request::RequestContext;
///
/// let replacer = VarsReplacer::new(HashMap::from([("root".to_owned(), "/www".to_owned())]));
/// let req = http::Request::builder().uri("/").body(()).unwrap();
/// let ctx = RequestContext::from_request(&req);
/// assert_eq!(replacer.replace_all("{http.vars.root}/site", &ctx), "/www/site");
/// assert_eq!(replacer.replace_all("{http.vars.missing}", &ctx), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VarsReplacer {
    vars: HashMap<String, String>,
}

impl VarsReplacer {
    /// Create a replacer over the given `{http.vars.*}` values.
    #[must_use]
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    fn resolve(&self, placeholder: &str, ctx: &RequestContext) -> Option<String> {
        if let Some(name) = placeholder.strip_prefix("http.vars.") {
            return self.vars.get(name).cloned();
        }
        if let Some(name) = placeholder.strip_prefix("env.") {
            return std::env::var(name).ok();
        }
        match placeholder {
            "http.request.host" => ctx.host.clone(),
            "http.request.method" => Some(ctx.method.as_str().to_owned()),
            "http.request.uri.path" => Some(ctx.path.clone()),
            _ => None,
        }
    }
}

impl Replacer for VarsReplacer {
    fn replace_all(&self, template: &str, ctx: &RequestContext) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                // Unterminated placeholder, keep the text as is.
                out.push_str(&rest[open..]);
                return out;
            };
            if let Some(value) = self.resolve(&after[..close], ctx) {
                out.push_str(&value);
            }
            rest = &after[close + 1..];
        }

        out.push_str(rest);
        out
    }
}
