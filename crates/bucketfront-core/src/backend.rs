//! The storage seam between the HTTP layer and an object store.
//!
//! [`ObjectBackend`] is implemented by [`S3Backend`](crate::s3::S3Backend) for
//! real deployments and by [`MemoryBackend`](crate::memory::MemoryBackend) for
//! tests and local development.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

/// Lazily produced object bytes.
///
/// Dropping the stream releases the underlying backend connection.
pub type ObjectBody = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Boxed future returned by [`ObjectBackend::get_object`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResult, FetchError>> + Send + 'a>>;

/// A single object retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Bucket to read from.
    pub bucket: String,
    /// Fully composed object key.
    pub key: String,
    /// Raw `Range` header value, forwarded without validation.
    pub range: Option<String>,
}

/// Object metadata and body returned by a backend.
pub struct FetchResult {
    /// `Content-Type` reported by the backend.
    pub content_type: Option<String>,
    /// Length of the returned body in bytes.
    pub content_length: Option<i64>,
    /// Entity tag, passed through unchanged.
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
    /// `Cache-Control` reported by the backend.
    pub cache_control: Option<String>,
    /// `Content-Range` reported by the backend when it honored a range.
    pub content_range: Option<String>,
    /// The object bytes.
    pub body: ObjectBody,
}

impl fmt::Debug for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResult")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .field("cache_control", &self.cache_control)
            .field("content_range", &self.content_range)
            .finish_non_exhaustive()
    }
}

/// Coarse classification of a failed fetch.
///
/// Every kind is served to clients as `404 Not Found`; the kind only feeds logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The bucket or key does not exist.
    NotFound,
    /// The backend refused the credentials or the key.
    AccessDenied,
    /// The backend rejected the forwarded range.
    InvalidRange,
    /// The backend could not be reached or timed out.
    Network,
    /// Anything else.
    Other,
}

impl FetchErrorKind {
    /// Short identifier used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::InvalidRange => "invalid_range",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed object fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    /// Failure classification.
    pub kind: FetchErrorKind,
    /// Backend-provided detail.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error of the given kind.
    #[must_use]
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// A storage client bound to exactly one domain's configuration.
///
/// Implementations must be safe to call concurrently from many requests.
pub trait ObjectBackend: Send + Sync + 'static {
    /// Fetch an object, honoring `request.range` if present.
    fn get_object(&self, request: FetchRequest) -> FetchFuture<'_>;
}
