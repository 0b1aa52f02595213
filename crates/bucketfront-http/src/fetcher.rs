//! Object fetching: key composition, range passthrough and the backend call.

use bucketfront_core::{BackendConfig, DomainBackend, FetchError, FetchRequest, FetchResult};
use futures::TryStreamExt;
use percent_encoding::percent_decode_str;
use tracing::{error, info, warn};

/// Compose the object key for a request path.
///
/// A single leading `/` is removed from the path and the remainder is
/// percent-decoded. A non-empty prefix is joined with exactly one `/`.
///
/// # Examples
///
/// ```
/// use bucketfront_http::fetcher::object_key;
///
/// assert_eq!(object_key("/bar.txt", Some("foo/")), "foo/bar.txt");
/// assert_eq!(object_key("/bar.txt", Some("foo")), "foo/bar.txt");
/// assert_eq!(object_key("/bar.txt", None), "bar.txt");
/// ```
#[must_use]
pub fn object_key(path: &str, prefix: Option<&str>) -> String {
    let raw = path.strip_prefix('/').unwrap_or(path);
    let raw = percent_decode_str(raw).decode_utf8_lossy();

    match prefix.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{raw}"),
        _ => raw.into_owned(),
    }
}

/// Build the backend request for an inbound request.
///
/// The `Range` header is copied verbatim; the backend decides whether it is
/// valid. Non-UTF-8 bytes are replaced rather than dropping the header.
#[must_use]
pub fn fetch_request<B>(config: &BackendConfig, req: &http::Request<B>) -> FetchRequest {
    let range = req
        .headers()
        .get(http::header::RANGE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    FetchRequest {
        bucket: config.bucket.clone(),
        key: object_key(req.uri().path(), config.key_prefix.as_deref()),
        range,
    }
}

/// Fetch the object addressed by `req` from its domain's backend.
///
/// The returned body logs a failure that happens while it is being copied to
/// the client. Dropping the future (client gone) cancels the backend call.
pub async fn fetch<B>(
    domain: &str,
    backend: &DomainBackend,
    req: &http::Request<B>,
) -> Result<FetchResult, FetchError> {
    let request = fetch_request(&backend.config, req);
    let bucket = request.bucket.clone();
    let key = request.key.clone();

    info!(
        method = %req.method(),
        path = req.uri().path(),
        domain,
        bucket = %bucket,
        key = %key,
        range = ?request.range,
        "fetching object"
    );

    let mut result = backend.client.get_object(request).await.inspect_err(|err| {
        warn!(
            domain,
            bucket = %bucket,
            key = %key,
            kind = %err.kind,
            error = %err.message,
            "object unavailable"
        );
    })?;

    let domain = domain.to_owned();
    result.body = Box::pin(result.body.inspect_err(move |err| {
        error!(
            domain = %domain,
            bucket = %bucket,
            key = %key,
            error = %err,
            "failed to copy object body"
        );
    }));

    Ok(result)
}
