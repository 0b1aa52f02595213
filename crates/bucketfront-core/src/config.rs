//! Proxy configuration.
//!
//! The configuration is a YAML document with a listen port and a map from
//! public domain name to the storage settings serving that domain:
//!
//! ```yaml
//! port: "8080"
//! domains:
//!   assets.example.com:
//!     bucket: my-assets
//!     region: us-east-1
//!     endpoint: http://minio.internal:9000
//!     access_key: AKIAEXAMPLE
//!     secret_key: secret
//!     path_prefix: public/
//!     use_path_style: true
//! ```
//!
//! It is loaded once at startup and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use typed_builder::TypedBuilder;

use crate::error::ConfigError;

/// Port used when the configuration leaves `port` empty.
pub const DEFAULT_PORT: &str = "8080";

/// Domain written by [`ProxyConfig::sample`].
pub const SAMPLE_DOMAIN: &str = "example.com";

/// Storage settings for a single public domain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct BackendConfig {
    /// Bucket holding this domain's objects.
    #[builder(setter(into))]
    pub bucket: String,

    /// Region of the bucket (e.g. `"us-east-1"`).
    #[builder(setter(into))]
    pub region: String,

    /// Endpoint override for S3-compatible stores such as MinIO or R2.
    #[serde(
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    #[builder(default, setter(strip_option, into))]
    pub endpoint: Option<String>,

    /// Static access key ID.
    #[builder(setter(into))]
    pub access_key: String,

    /// Static secret access key.
    #[builder(setter(into))]
    pub secret_key: String,

    /// Prefix joined in front of every request path before the bucket lookup.
    #[serde(
        rename = "path_prefix",
        default,
        deserialize_with = "non_blank",
        skip_serializing_if = "Option::is_none"
    )]
    #[builder(default, setter(strip_option, into))]
    pub key_prefix: Option<String>,

    /// Address the bucket in the URL path instead of the host name.
    #[serde(default)]
    #[builder(default = false)]
    pub use_path_style: bool,
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("key_prefix", &self.key_prefix)
            .field("use_path_style", &self.use_path_style)
            .finish()
    }
}

/// Top-level proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listen port. Empty means [`DEFAULT_PORT`].
    #[serde(default, deserialize_with = "port_string")]
    pub port: String,

    /// Public domain name to storage settings.
    #[serde(default)]
    pub domains: BTreeMap<String, BackendConfig>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_owned(),
            domains: BTreeMap::new(),
        }
    }
}

impl ProxyConfig {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.listen_port()?;

        Ok(config)
    }

    /// Serialize this configuration as YAML and write it to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// A sample configuration with one placeholder domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use bucketfront_core::config::{ProxyConfig, DEFAULT_PORT, SAMPLE_DOMAIN};
    ///
    /// let sample = ProxyConfig::sample();
    /// assert_eq!(sample.port, DEFAULT_PORT);
    /// assert!(sample.domains.contains_key(SAMPLE_DOMAIN));
    /// ```
    #[must_use]
    pub fn sample() -> Self {
        let backend = BackendConfig::builder()
            .bucket("<your-s3-bucket>")
            .region("<your-s3-region>")
            .endpoint("<your-s3-endpoint>")
            .access_key("<your-s3-access-key>")
            .secret_key("<your-s3-secret-key>")
            .key_prefix("<your-s3-path-prefix>")
            .use_path_style(false)
            .build();

        Self {
            port: DEFAULT_PORT.to_owned(),
            domains: BTreeMap::from([(SAMPLE_DOMAIN.to_owned(), backend)]),
        }
    }

    /// The TCP port to listen on, falling back to [`DEFAULT_PORT`] when unset.
    pub fn listen_port(&self) -> Result<u16, ConfigError> {
        let port = self.port.trim();
        let port = if port.is_empty() { DEFAULT_PORT } else { port };
        port.parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(self.port.clone()))
    }
}

/// Deserialize an optional string, mapping blank values to `None`.
fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

/// Accept the port as either a YAML string or an integer.
fn port_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Option::<Port>::deserialize(deserializer)? {
        Some(Port::Text(s)) => s,
        Some(Port::Number(n)) => n.to_string(),
        None => String::new(),
    })
}
