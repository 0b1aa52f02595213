//! In-memory [`ObjectBackend`] for tests and local development.
//!
//! Objects live in a map keyed by `(bucket, key)`. Every request is recorded so
//! callers can assert exactly what the proxy sent to its backend. A backend can
//! also be switched into a failing mode to simulate outages.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::backend::{
    FetchError, FetchErrorKind, FetchFuture, FetchRequest, FetchResult, ObjectBackend, ObjectBody,
};

/// Size of the chunks the body stream is split into.
const CHUNK_SIZE: usize = 16 * 1024;

/// A stored object and its metadata.
#[derive(Debug, Clone, Default)]
pub struct MemoryObject {
    /// Object bytes.
    pub data: Bytes,
    /// `Content-Type` to report.
    pub content_type: Option<String>,
    /// Entity tag to report.
    pub etag: Option<String>,
    /// Modification time to report.
    pub last_modified: Option<DateTime<Utc>>,
    /// `Cache-Control` to report.
    pub cache_control: Option<String>,
}

impl MemoryObject {
    /// Create an object holding `data` with no metadata.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }
}

/// An in-memory object store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: HashMap<(String, String), MemoryObject>,
    failure: Option<FetchErrorKind>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that fails every fetch with `kind`.
    #[must_use]
    pub fn failing(kind: FetchErrorKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::default()
        }
    }

    /// Store an object.
    #[must_use]
    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        object: MemoryObject,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), object);
        self
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, FetchError> {
        if let Some(kind) = self.failure {
            return Err(FetchError::new(kind, "simulated backend failure"));
        }

        let object = self
            .objects
            .get(&(request.bucket.clone(), request.key.clone()))
            .ok_or_else(|| {
                FetchError::new(
                    FetchErrorKind::NotFound,
                    format!("no such key: {}/{}", request.bucket, request.key),
                )
            })?;

        let total = object.data.len();
        let (data, content_range) = match request.range.as_deref() {
            Some(range) => {
                let (start, end) = parse_range(range, total).ok_or_else(|| {
                    FetchError::new(FetchErrorKind::InvalidRange, format!("invalid range {range}"))
                })?;
                (
                    object.data.slice(start..=end),
                    Some(format!("bytes {start}-{end}/{total}")),
                )
            }
            None => (object.data.clone(), None),
        };

        Ok(FetchResult {
            content_type: object.content_type.clone(),
            content_length: i64::try_from(data.len()).ok(),
            etag: object.etag.clone(),
            last_modified: object.last_modified,
            cache_control: object.cache_control.clone(),
            content_range,
            body: chunked(data),
        })
    }
}

impl ObjectBackend for MemoryBackend {
    fn get_object(&self, request: FetchRequest) -> FetchFuture<'_> {
        self.requests.lock().push(request.clone());
        let result = self.fetch(&request);
        Box::pin(async move { result })
    }
}

/// Resolve a single `bytes=` range against an object of `total` bytes.
///
/// Returns inclusive `(start, end)` offsets, or `None` when unsatisfiable.
fn parse_range(value: &str, total: usize) -> Option<(usize, usize)> {
    let spec = value.strip_prefix("bytes=")?;
    let (first, last) = spec.split_once('-')?;
    if total == 0 {
        return None;
    }

    let (start, end) = if first.is_empty() {
        let suffix: usize = last.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        (total.saturating_sub(suffix), total - 1)
    } else {
        let start: usize = first.parse().ok()?;
        let end = if last.is_empty() {
            total - 1
        } else {
            last.parse::<usize>().ok()?.min(total - 1)
        };
        (start, end)
    };

    (start <= end && start < total).then_some((start, end))
}

fn chunked(data: Bytes) -> ObjectBody {
    let chunks: Vec<Result<Bytes, std::io::Error>> = (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}
