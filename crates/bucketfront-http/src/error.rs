//! Per-request failures and their HTTP rendering.

use bucketfront_core::FetchError;
use http::StatusCode;

use crate::body::ProxyBody;

/// Why a request could not be served.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Only GET and HEAD are served.
    #[error("method {0} is not allowed")]
    MethodNotAllowed(http::Method),

    /// The host is not a configured domain.
    #[error("unknown domain {0:?}")]
    UnknownDomain(String),

    /// The backend could not deliver the object, for whatever reason.
    #[error("object unavailable: {0}")]
    ObjectUnavailable(#[from] FetchError),
}

impl RequestError {
    /// The status code returned to the client.
    ///
    /// Fetch failures always map to 404, whatever the backend reported.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::UnknownDomain(_) => StatusCode::FORBIDDEN,
            Self::ObjectUnavailable(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// Render an error as a plain-text response carrying the status reason phrase.
#[must_use]
pub fn error_to_response(err: &RequestError) -> http::Response<ProxyBody> {
    let status = err.status_code();
    let reason = status.canonical_reason().unwrap_or("Error");

    http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(http::header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(ProxyBody::from_string(format!("{reason}\n")))
        .unwrap_or_else(|_| {
            http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(ProxyBody::empty())
                .expect("static response should be valid")
        })
}
