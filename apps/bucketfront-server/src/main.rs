//! Bucketfront - read-only reverse proxy for S3 bucket objects.
//!
//! Each configured domain maps to a bucket (plus optional key prefix) in an
//! S3-compatible store. Requests are routed by their `Host` header.
//!
//! # Usage
//!
//! ```text
//! bucketfront-server --mode init --config config.yaml   # write a sample config
//! bucketfront-server --config config.yaml               # serve
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCKETFRONT_CONFIG` | `config.yaml` | Configuration file path |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use bucketfront_core::{BackendRegistry, ProxyConfig};
use bucketfront_http::{ConnectionTimeouts, ProxyService, serve};
use clap::{Parser, ValueEnum};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Write a sample configuration file and exit.
    Init,
    /// Load the configuration and serve.
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "bucketfront-server")]
#[command(about = "Read-only reverse proxy for S3 bucket objects", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(long, default_value = "config.yaml", env = "BUCKETFRONT_CONFIG")]
    config: PathBuf,

    /// What to do with the configuration file
    #[arg(long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,

    /// Log level filter (ignored when RUST_LOG is set)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    log_format: LogFormat,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `--log-level` value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

/// Write the sample configuration to `path`.
fn write_sample_config(path: &Path) -> Result<()> {
    ProxyConfig::sample()
        .save(path)
        .with_context(|| format!("failed to write sample config to {}", path.display()))
}

/// What `--mode init` tells the user after writing the sample.
fn init_message(path: &Path) -> String {
    format!(
        "sample configuration written to {path}\n\
         edit the <your-s3-...> placeholders before running: \
         the server refuses to start while they are present",
        path = path.display()
    )
}

/// Load the configuration and build one backend client per domain.
fn load(path: &Path) -> Result<(SocketAddr, BackendRegistry)> {
    let config = ProxyConfig::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    let port = config.listen_port()?;
    let registry =
        BackendRegistry::from_config(&config).context("failed to initialize backends")?;

    Ok((SocketAddr::from(([0, 0, 0, 0], port)), registry))
}

async fn run(path: &Path) -> Result<()> {
    let (addr, registry) = load(path)?;

    for domain in registry.domains() {
        if let Some(backend) = registry.resolve(domain) {
            info!(
                domain,
                bucket = %backend.config.bucket,
                region = %backend.config.region,
                prefix = backend.config.key_prefix.as_deref().unwrap_or_default(),
                "configured domain"
            );
        }
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, domains = registry.len(), "listening for connections");

    let service = ProxyService::new(Arc::new(registry));
    serve(listener, service, ConnectionTimeouts::default(), async {
        tokio::signal::ctrl_c().await.ok();
    })
    .await;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level, args.log_format)?;

    match args.mode {
        Mode::Init => {
            write_sample_config(&args.config)?;
            println!("{}", init_message(&args.config));
            Ok(())
        }
        Mode::Run => {
            info!(
                config = %args.config.display(),
                version = VERSION,
                "starting Bucketfront",
            );
            run(&args.config).await
        }
    }
}
