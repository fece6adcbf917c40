//! Translation of HTTP validators into object-storage request parameters.
//!
//! Five request headers are forwarded to the storage backend: `Range`,
//! `If-Match`, `If-None-Match`, `If-Modified-Since` and `If-Unmodified-Since`.
//! The two date headers must be valid IMF-fixdate values (the `http-date`
//! format of RFC 7231); anything else is dropped so the request proceeds
//! unconditionally instead of sending a malformed date upstream.

use chrono::{DateTime, NaiveDateTime, Utc};
use http::HeaderMap;
use http::header::{IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_UNMODIFIED_SINCE, RANGE};

/// The `http-date` layout, e.g. `Mon, 15 Jan 2024 10:30:00 GMT`.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// The `http-date` layout after the `Ddd, ` weekday prefix.
const HTTP_DATE_BODY_FORMAT: &str = "%d %b %Y %H:%M:%S GMT";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Conditional parameters attached to a single `GetObject` call.
///
/// Every field is independent: absent headers leave their field `None`, and no
/// defaults are synthesized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalParams {
    /// Raw `Range` header value.
    pub range: Option<String>,
    /// Raw `If-Match` header value.
    pub if_match: Option<String>,
    /// Raw `If-None-Match` header value.
    pub if_none_match: Option<String>,
    /// Parsed `If-Modified-Since` header.
    pub if_modified_since: Option<DateTime<Utc>>,
    /// Parsed `If-Unmodified-Since` header.
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl ConditionalParams {
    /// Extract conditional parameters from request headers.
    ///
    /// Only the first value of each header is considered. Values are taken
    /// byte for byte, with invalid UTF-8 replaced. Empty values and
    /// unparseable dates are treated as absent.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            range: header_value(headers, &RANGE),
            if_match: header_value(headers, &IF_MATCH),
            if_none_match: header_value(headers, &IF_NONE_MATCH),
            if_modified_since: header_value(headers, &IF_MODIFIED_SINCE)
                .and_then(|v| parse_http_date(&v)),
            if_unmodified_since: header_value(headers, &IF_UNMODIFIED_SINCE)
                .and_then(|v| parse_http_date(&v)),
        }
    }

    /// Returns `true` when no conditional parameter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_none()
            && self.if_match.is_none()
            && self.if_none_match.is_none()
            && self.if_modified_since.is_none()
            && self.if_unmodified_since.is_none()
    }
}

fn header_value(headers: &HeaderMap, name: &http::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .filter(|v| !v.is_empty())
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

/// Parse an `http-date` (IMF-fixdate) string.
///
/// The weekday must be one of the seven day names but is not checked against
/// the date.
///
/// # Examples
///
/// ```
/// use s3proxy_core::conditional::parse_http_date;
///
/// assert!(parse_http_date("Mon, 15 Jan 2024 10:30:00 GMT").is_some());
/// assert!(parse_http_date("Tue, 15 Jan 2024 10:30:00 GMT").is_some());
/// assert!(parse_http_date("2024-01-15T10:30:00Z").is_none());
/// ```
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let (weekday, rest) = value.split_once(", ")?;
    if !WEEKDAYS.contains(&weekday) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest, HTTP_DATE_BODY_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// Format a timestamp as an `http-date` in UTC.
#[must_use]
pub fn format_http_date(value: &DateTime<Utc>) -> String {
    value.format(HTTP_DATE_FORMAT).to_string()
}
