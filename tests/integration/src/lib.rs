//! End-to-end tests for the Bucketfront proxy.
//!
//! Each test starts a real server on an ephemeral local port, backed by
//! in-memory object stores, and talks to it over TCP with `reqwest`. Domain
//! names are resolved to the local listener, so requests carry realistic
//! `Host` headers including the port.
//!
//! Fixture domains:
//!
//! | Domain | Bucket | Prefix | Backend |
//! |--------|--------|--------|---------|
//! | `assets.test` | `assets` | `public/` | objects listed in [`ASSET_OBJECTS`] |
//! | `media.test` | `media` | *(none)* | `clip.bin`, 1 MiB of patterned bytes |
//! | `broken.test` | `broken` | *(none)* | every fetch fails |

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use bucketfront_core::memory::{MemoryBackend, MemoryObject};
use bucketfront_core::{BackendConfig, BackendRegistry, FetchErrorKind, ObjectBackend};
use bucketfront_http::{ConnectionTimeouts, ProxyService, serve};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Keys stored in the `assets` bucket and their contents.
pub const ASSET_OBJECTS: &[(&str, &str)] = &[
    ("public/index.html", "<h1>hello</h1>"),
    ("public/css/site.css", "body { margin: 0 }"),
    ("public/docs/annual report.txt", "revenue up"),
];

/// Hosts the test client resolves to the server.
const HOSTS: &[&str] = &["assets.test", "media.test", "broken.test", "unknown.test"];

/// Size of `media.test/clip.bin`.
pub const CLIP_LEN: usize = 1024 * 1024;

/// Patterned content of `media.test/clip.bin`.
#[must_use]
pub fn clip_bytes() -> Bytes {
    #[allow(clippy::cast_possible_truncation)]
    let data: Vec<u8> = (0..CLIP_LEN).map(|i| (i % 251) as u8).collect();
    Bytes::from(data)
}

fn backend_config(bucket: &str, prefix: Option<&str>) -> BackendConfig {
    let mut config = BackendConfig::builder()
        .bucket(bucket)
        .region("us-east-1")
        .access_key("test")
        .secret_key("test")
        .build();
    config.key_prefix = prefix.map(str::to_owned);
    config
}

/// In-memory backends behind the fixture domains.
#[derive(Debug)]
pub struct Backends {
    /// Backend of `assets.test`.
    pub assets: Arc<MemoryBackend>,
    /// Backend of `media.test`.
    pub media: Arc<MemoryBackend>,
}

fn fixture_registry() -> (BackendRegistry, Backends) {
    let last_modified = Utc
        .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid date");

    let assets = ASSET_OBJECTS
        .iter()
        .fold(MemoryBackend::new(), |backend, (key, data)| {
            let content_type = if key.ends_with(".html") {
                "text/html"
            } else {
                "text/plain"
            };
            backend.with_object(
                "assets",
                *key,
                MemoryObject {
                    content_type: Some(content_type.to_owned()),
                    etag: Some(format!("\"{}\"", data.len())),
                    last_modified: Some(last_modified),
                    cache_control: Some("public, max-age=300".to_owned()),
                    ..MemoryObject::new(*data)
                },
            )
        });
    let assets = Arc::new(assets);
    let media = Arc::new(MemoryBackend::new().with_object(
        "media",
        "clip.bin",
        MemoryObject {
            content_type: Some("application/octet-stream".to_owned()),
            ..MemoryObject::new(clip_bytes())
        },
    ));

    let registry = BackendRegistry::from_backends([
        (
            "assets.test".to_owned(),
            backend_config("assets", Some("public/")),
            Arc::clone(&assets) as Arc<dyn ObjectBackend>,
        ),
        (
            "media.test".to_owned(),
            backend_config("media", None),
            Arc::clone(&media) as Arc<dyn ObjectBackend>,
        ),
        (
            "broken.test".to_owned(),
            backend_config("broken", None),
            Arc::new(MemoryBackend::failing(FetchErrorKind::Network)) as Arc<dyn ObjectBackend>,
        ),
    ]);

    (registry, Backends { assets, media })
}

/// A proxy running on a local ephemeral port.
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    /// The in-memory stores behind the fixture domains.
    pub backends: Backends,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a proxy serving the fixture domains.
    pub async fn start() -> Self {
        init_tracing();

        let (registry, backends) = fixture_registry();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, stop) = oneshot::channel::<()>();

        let service = ProxyService::new(Arc::new(registry));
        let handle = tokio::spawn(serve(
            listener,
            service,
            ConnectionTimeouts::default(),
            async move {
                stop.await.ok();
            },
        ));

        Self {
            addr,
            backends,
            shutdown: Some(shutdown),
            handle: Some(handle),
        }
    }

    /// URL of `path` on `host`, including the listener port.
    #[must_use]
    pub fn url(&self, host: &str, path: &str) -> String {
        format!("http://{host}:{}{path}", self.addr.port())
    }

    /// An HTTP client resolving every fixture host to this server.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        HOSTS
            .iter()
            .fold(reqwest::Client::builder().no_proxy(), |builder, host| {
                builder.resolve(host, self.addr)
            })
            .build()
            .expect("http client")
    }

    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            handle.await.expect("server task");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

mod test_error;
mod test_object;
mod test_range;
