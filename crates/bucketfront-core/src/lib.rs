//! Configuration, backend registry and object storage clients for Bucketfront.
//!
//! Bucketfront is a read-only reverse proxy that maps public domains onto
//! buckets in S3-compatible object stores. This crate holds everything below
//! the HTTP layer:
//!
//! - [`config`]: the YAML configuration document ([`ProxyConfig`], [`BackendConfig`]).
//! - [`backend`]: the [`ObjectBackend`] trait and the fetch request/result types.
//! - [`s3`]: the AWS SDK backed implementation.
//! - [`memory`]: an in-memory implementation for tests and local development.
//! - [`registry`]: the immutable domain to backend map built at startup.

pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod registry;
pub mod s3;

pub use backend::{FetchError, FetchErrorKind, FetchRequest, FetchResult, ObjectBackend, ObjectBody};
pub use config::{BackendConfig, ProxyConfig};
pub use error::{BackendInitError, ConfigError};
pub use registry::{BackendRegistry, DomainBackend};
