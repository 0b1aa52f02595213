//! Translation of backend object metadata into an HTTP response.

use bucketfront_core::FetchResult;
use chrono::{DateTime, Utc};
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};

use crate::body::ProxyBody;

/// Set an optional header on a response builder if the value is `Some` and valid.
fn set_optional_header(
    builder: http::response::Builder,
    name: header::HeaderName,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Format a timestamp as an HTTP date (IMF-fixdate).
fn http_date(value: &DateTime<Utc>) -> String {
    value.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the client response for a fetched object.
///
/// `Access-Control-Allow-Origin: *` is always set; the metadata headers only
/// when the backend reported them. A HEAD response drops the body unread.
/// When the client asked for a range and the backend answered with a
/// `Content-Range`, the response is `206 Partial Content`.
#[must_use]
pub fn object_response(
    result: FetchResult,
    method: &Method,
    range_requested: bool,
) -> http::Response<ProxyBody> {
    let FetchResult {
        content_type,
        content_length,
        etag,
        last_modified,
        cache_control,
        content_range,
        body,
    } = result;

    let status = if range_requested && content_range.is_some() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut builder = http::Response::builder()
        .status(status)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    builder = set_optional_header(builder, header::CONTENT_TYPE, content_type.as_deref());
    if let Some(length) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }
    builder = set_optional_header(builder, header::ETAG, etag.as_deref());
    builder = set_optional_header(
        builder,
        header::LAST_MODIFIED,
        last_modified.as_ref().map(http_date).as_deref(),
    );
    builder = set_optional_header(builder, header::CACHE_CONTROL, cache_control.as_deref());
    if status == StatusCode::PARTIAL_CONTENT {
        builder = set_optional_header(builder, header::CONTENT_RANGE, content_range.as_deref());
    }

    let body = if method == Method::HEAD {
        drop(body);
        ProxyBody::empty()
    } else {
        ProxyBody::streaming(body)
    };

    builder.body(body).unwrap_or_else(|_| {
        http::Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .body(ProxyBody::empty())
            .expect("static response should be valid")
    })
}
