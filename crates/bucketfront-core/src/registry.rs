//! Per-domain backend registry.
//!
//! The registry is built once at startup and never changes afterwards, so it is
//! shared across requests behind an `Arc` without any locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::backend::ObjectBackend;
use crate::config::{BackendConfig, ProxyConfig};
use crate::error::BackendInitError;
use crate::s3::S3Backend;

/// A configured domain: its storage settings and the client serving it.
#[derive(Clone)]
pub struct DomainBackend {
    /// Storage settings for the domain.
    pub config: BackendConfig,
    /// Client bound to `config`.
    pub client: Arc<dyn ObjectBackend>,
}

impl std::fmt::Debug for DomainBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainBackend")
            .field("config", &self.config)
            .field("client", &"...")
            .finish()
    }
}

/// Immutable map from domain name to its backend.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    domains: BTreeMap<String, DomainBackend>,
}

impl BackendRegistry {
    /// Build an S3 client for every configured domain.
    ///
    /// Fails as a whole if any single domain cannot be initialized.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, BackendInitError> {
        let mut domains = BTreeMap::new();
        for (domain, backend) in &config.domains {
            let client = S3Backend::new(domain, backend)?;
            domains.insert(
                domain.clone(),
                DomainBackend {
                    config: backend.clone(),
                    client: Arc::new(client),
                },
            );
        }

        info!(domains = domains.len(), "initialized backend registry");
        Ok(Self { domains })
    }

    /// Build a registry from already constructed backends.
    pub fn from_backends(
        entries: impl IntoIterator<Item = (String, BackendConfig, Arc<dyn ObjectBackend>)>,
    ) -> Self {
        let domains = entries
            .into_iter()
            .map(|(domain, config, client)| (domain, DomainBackend { config, client }))
            .collect();
        Self { domains }
    }

    /// Look up a domain by exact name.
    #[must_use]
    pub fn resolve(&self, domain: &str) -> Option<&DomainBackend> {
        self.domains.get(domain)
    }

    /// Configured domain names in sorted order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    /// Number of configured domains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether no domain is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
