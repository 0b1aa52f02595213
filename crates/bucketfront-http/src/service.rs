//! The proxy's hyper `Service`.
//!
//! [`ProxyService`] runs every request through the pipeline:
//!
//! 1. Route by method and `Host` ([`router::route`](crate::router::route))
//! 2. Fetch the object ([`fetcher::fetch`](crate::fetcher::fetch))
//! 3. Translate the result ([`response::object_response`](crate::response::object_response))
//!
//! Requests share nothing but the immutable [`BackendRegistry`].

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bucketfront_core::BackendRegistry;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::body::ProxyBody;
use crate::error::{RequestError, error_to_response};
use crate::fetcher;
use crate::response::object_response;
use crate::router;

/// Host-routed object proxy service.
#[derive(Debug, Clone)]
pub struct ProxyService {
    registry: Arc<BackendRegistry>,
}

impl ProxyService {
    /// Create a service serving the domains in `registry`.
    #[must_use]
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this service routes against.
    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Handle one request.
    ///
    /// The request body is never read, so any body type is accepted.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ProxyBody> {
        let request_id = Uuid::new_v4();
        let span = info_span!("request", %request_id);
        process_request(&self.registry, &req)
            .instrument(span)
            .await
    }
}

impl Service<http::Request<Incoming>> for ProxyService {
    type Response = http::Response<ProxyBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        // GET and HEAD carry no meaningful body.
        let (parts, _body) = req.into_parts();
        let req = http::Request::from_parts(parts, ());
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

async fn process_request<B>(
    registry: &BackendRegistry,
    req: &http::Request<B>,
) -> http::Response<ProxyBody> {
    debug!(method = %req.method(), uri = %req.uri(), "processing request");

    match serve_object(registry, req).await {
        Ok(response) => response,
        Err(err) => {
            if let RequestError::UnknownDomain(domain) = &err {
                warn!(domain = %domain, "domain not found");
            }
            error_to_response(&err)
        }
    }
}

async fn serve_object<B>(
    registry: &BackendRegistry,
    req: &http::Request<B>,
) -> Result<http::Response<ProxyBody>, RequestError> {
    let (domain, backend) = router::route(registry, req)?;

    let result = fetcher::fetch(domain, backend, req).await?;
    let range_requested = req.headers().contains_key(http::header::RANGE);
    Ok(object_response(result, req.method(), range_requested))
}
