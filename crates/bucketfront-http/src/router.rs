//! Host-based request routing.
//!
//! A request is routed by its `Host` header alone: the port suffix is dropped
//! and the remaining hostname must exactly match a configured domain. There is
//! no wildcard or subdomain matching and no case folding.

use bucketfront_core::{BackendRegistry, DomainBackend};
use http::Method;

use crate::error::RequestError;

/// Resolve the domain and backend serving `req`.
///
/// # Errors
///
/// - [`RequestError::MethodNotAllowed`] for anything but GET and HEAD.
/// - [`RequestError::UnknownDomain`] when the host is missing or not configured.
pub fn route<'r, 'q, B>(
    registry: &'r BackendRegistry,
    req: &'q http::Request<B>,
) -> Result<(&'q str, &'r DomainBackend), RequestError> {
    let method = req.method();
    if method != Method::GET && method != Method::HEAD {
        return Err(RequestError::MethodNotAllowed(method.clone()));
    }

    let host = request_host(req).unwrap_or_default();
    let domain = routing_key(host);
    registry
        .resolve(domain)
        .map(|backend| (domain, backend))
        .ok_or_else(|| RequestError::UnknownDomain(domain.to_owned()))
}

/// The host a request was addressed to.
///
/// HTTP/1 carries it in the `Host` header; HTTP/2 in the `:authority`
/// pseudo-header, which hyper exposes through the request URI.
fn request_host<B>(req: &http::Request<B>) -> Option<&str> {
    req.headers()
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
}

/// Strip a trailing `:port` from a host value.
///
/// The port may be empty (`host:`); a suffix containing anything but digits
/// is kept, so bracketed IPv6 literals survive.
///
/// # Examples
///
/// ```
/// use bucketfront_http::router::routing_key;
///
/// assert_eq!(routing_key("cdn.example.com:8080"), "cdn.example.com");
/// assert_eq!(routing_key("cdn.example.com"), "cdn.example.com");
/// ```
#[must_use]
pub fn routing_key(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
