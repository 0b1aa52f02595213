//! Startup error types for Bucketfront.
//!
//! Both error families are fatal: the proxy never starts serving with a
//! configuration it could not read or with a partially built backend set.

use std::path::PathBuf;

/// Errors raised while reading, parsing or writing the proxy configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not a valid configuration document.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The configuration document could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// The configuration file could not be written.
    #[error("failed to write config file {path}: {source}")]
    Write {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The listen port is not a valid TCP port number.
    #[error("invalid listen port {0:?}: must be an integer between 0 and 65535")]
    InvalidPort(String),
}

/// Errors raised while building the storage client for a configured domain.
#[derive(Debug, thiserror::Error)]
pub enum BackendInitError {
    /// A required backend field is empty.
    #[error("domain {domain}: missing required field `{field}`")]
    MissingField {
        /// The domain whose configuration is incomplete.
        domain: String,
        /// The name of the empty field.
        field: &'static str,
    },

    /// The endpoint override is not an absolute http(s) URL.
    #[error("domain {domain}: invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The domain whose endpoint is invalid.
        domain: String,
        /// The configured endpoint value.
        endpoint: String,
        /// Why the endpoint was rejected.
        reason: String,
    },
}
