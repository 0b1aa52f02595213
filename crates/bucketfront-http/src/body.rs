//! Response body type supporting buffered, streaming and empty modes.
//!
//! - **Buffered**: small fixed payloads such as error messages.
//! - **Streaming**: object bytes forwarded frame by frame from the backend, so
//!   memory per request stays bounded regardless of object size.
//! - **Empty**: HEAD responses.

use std::pin::Pin;
use std::task::{Context, Poll};

use bucketfront_core::ObjectBody;
use bytes::Bytes;
use futures::Stream;
use http_body::{Body, Frame};
use http_body_util::Full;

/// Response body used by every proxy response.
#[derive(Default)]
pub enum ProxyBody {
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Object bytes pulled lazily from the backend.
    Streaming(ObjectBody),
    /// No body at all.
    #[default]
    Empty,
}

impl std::fmt::Debug for ProxyBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(full) => f.debug_tuple("Buffered").field(full).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

impl ProxyBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a streaming body.
    #[must_use]
    pub fn streaming(body: ObjectBody) -> Self {
        Self::Streaming(body)
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl Body for ProxyBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming(stream) => stream
                .as_mut()
                .poll_next(cx)
                .map(|chunk| chunk.map(|res| res.map(Frame::data))),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming(_) => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming(_) => http_body::SizeHint::default(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}
