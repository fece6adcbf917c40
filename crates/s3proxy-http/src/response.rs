//! Response reconstruction from object metadata.
//!
//! Only a fixed allow-list of object metadata becomes response headers:
//! `Cache-Control`, `Content-Disposition`, `Content-Encoding`,
//! `Content-Language`, `Content-Range`, `Content-Type`, `ETag`, `Expires` and
//! `Last-Modified`. User-defined metadata passes through as-is. Values that are
//! not valid header values are skipped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use http::HeaderMap;
use http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LANGUAGE, CONTENT_LENGTH,
    CONTENT_RANGE, CONTENT_TYPE, ETAG, EXPIRES, HeaderName, HeaderValue, LAST_MODIFIED,
};
use s3proxy_core::conditional::format_http_date;
use s3proxy_core::{ObjectBody, ObjectResponse, ProxyError, ProxyResult};
use tracing::{error, warn};

use crate::body::ProxyResponseBody;

/// Header marking responses served from object storage.
pub const CACHE_MARKER_HEADER: &str = "x-cache-s3";

/// Value of [`CACHE_MARKER_HEADER`].
pub const CACHE_MARKER_VALUE: &str = "hit";

/// Build the `200 OK` response for a fetched object.
///
/// The first body chunk is read before the response is returned, so a body
/// that fails immediately yields [`ProxyError::Streaming`] and the request can
/// still be delegated. Later errors end the response stream.
pub async fn reconstruct(
    key: &str,
    object: ObjectResponse,
) -> ProxyResult<http::Response<ProxyResponseBody>> {
    let ObjectResponse {
        cache_control,
        content_disposition,
        content_encoding,
        content_language,
        content_range,
        content_type,
        e_tag,
        expires,
        last_modified,
        metadata,
        body,
        ..
    } = object;

    let mut headers = HeaderMap::new();
    set_str_header(&mut headers, CACHE_CONTROL, cache_control.as_deref());
    set_str_header(&mut headers, CONTENT_DISPOSITION, content_disposition.as_deref());
    set_str_header(&mut headers, CONTENT_ENCODING, content_encoding.as_deref());
    set_str_header(&mut headers, CONTENT_LANGUAGE, content_language.as_deref());
    set_str_header(&mut headers, CONTENT_RANGE, content_range.as_deref());
    set_str_header(&mut headers, CONTENT_TYPE, content_type.as_deref());
    set_str_header(&mut headers, ETAG, e_tag.as_deref());
    set_str_header(&mut headers, EXPIRES, expires.as_deref());
    if let Some(ts) = last_modified.filter(|ts| *ts != DateTime::<Utc>::UNIX_EPOCH) {
        set_str_header(&mut headers, LAST_MODIFIED, Some(&format_http_date(&ts)));
    }
    set_metadata_headers(&mut headers, &metadata);

    headers.insert(
        HeaderName::from_static(CACHE_MARKER_HEADER),
        HeaderValue::from_static(CACHE_MARKER_VALUE),
    );

    let body = match body {
        Some(body) => {
            // The streamed copy determines the transferred length.
            headers.remove(CONTENT_LENGTH);
            prime_body(key, body).await?
        }
        None => ProxyResponseBody::empty(),
    };

    let mut response = http::Response::new(body);
    *response.status_mut() = http::StatusCode::OK;
    *response.headers_mut() = headers;
    Ok(response)
}

/// Set a header when the value is present, non-empty, and a valid header value.
fn set_str_header(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    match HeaderValue::from_str(value) {
        Ok(hv) => {
            headers.insert(name, hv);
        }
        Err(_) => warn!(header = %name, "skipping invalid header value from object metadata"),
    }
}

/// Copy user-defined metadata into the response headers, key and value verbatim.
fn set_metadata_headers(headers: &mut HeaderMap, metadata: &HashMap<String, String>) {
    for (key, value) in metadata {
        match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => set_str_header(headers, name, Some(value)),
            Err(_) => warn!(header = %key, "skipping invalid metadata header name"),
        }
    }
}

/// Read the first chunk of `body` and return a streaming body that replays it.
async fn prime_body(key: &str, mut body: ObjectBody) -> ProxyResult<ProxyResponseBody> {
    let first = match body.next().await {
        None => return Ok(ProxyResponseBody::empty()),
        Some(Err(err)) => {
            error!(key, error = %err, "cache:fail");
            return Err(ProxyError::Streaming(err));
        }
        Some(Ok(chunk)) => chunk,
    };

    let key = key.to_owned();
    let rest = body.inspect_err(move |err| {
        error!(key = %key, error = %err, "object body stream failed mid-response");
    });
    Ok(ProxyResponseBody::streaming(
        futures::stream::once(async move { Ok(first) }).chain(rest),
    ))
}
