//! HTTP layer for Bucketfront: host routing, object fetching, response
//! translation and the hyper server.
//!
//! - **Routing** ([`router`]): Accepts GET and HEAD only and picks the backend
//!   whose domain equals the request `Host` with its port stripped.
//!
//! - **Fetching** ([`fetcher`]): Composes the object key from the configured
//!   prefix and the request path, forwards `Range` verbatim and calls the
//!   domain's [`ObjectBackend`](bucketfront_core::ObjectBackend).
//!
//! - **Response** ([`response`]): Copies object metadata into response headers
//!   and streams the body, or drops it for HEAD.
//!
//! - **Service** ([`service`]): [`ProxyService`], the hyper `Service` tying the
//!   steps together.
//!
//! - **Server** ([`server`]): The accept loop, with per-connection idle
//!   deadlines from [`io`].
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ProxyService (hyper Service)
//!     -> route: method check, Host -> BackendRegistry      (405 / 403)
//!     -> fetch: prefix + path -> ObjectBackend::get_object (404)
//!     -> object_response: metadata headers + CORS
//!   <- HTTP Response (streamed body)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bucketfront_core::BackendRegistry;
//! use bucketfront_http::{ConnectionTimeouts, ProxyService, serve};
//!
//! # async fn run(registry: BackendRegistry) -> std::io::Result<()> {
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! let service = ProxyService::new(Arc::new(registry));
//! serve(listener, service, ConnectionTimeouts::default(), async {
//!     tokio::signal::ctrl_c().await.ok();
//! })
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod error;
pub mod fetcher;
pub mod io;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use body::ProxyBody;
pub use error::{RequestError, error_to_response};
pub use io::{ConnectionTimeouts, DeadlineIo};
pub use response::object_response;
pub use server::serve;
pub use service::ProxyService;
