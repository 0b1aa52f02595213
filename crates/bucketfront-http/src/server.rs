//! The TCP accept loop.

use std::future::Future;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::io::{ConnectionTimeouts, DeadlineIo};
use crate::service::ProxyService;

/// Serve connections from `listener` until `shutdown` completes.
///
/// Each connection runs on its own task and speaks HTTP/1.1 or HTTP/2.
/// Once `shutdown` resolves no new connections are accepted; connections
/// already open are not waited for. Accept failures are logged and skipped.
pub async fn serve<F>(
    listener: TcpListener,
    service: ProxyService,
    timeouts: ConnectionTimeouts,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let http = HttpConnBuilder::new(TokioExecutor::new());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                debug!(peer_addr = %peer_addr, "accepted connection");

                let http = http.clone();
                let svc = service.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(DeadlineIo::new(stream, timeouts));
                    if let Err(e) = http.serve_connection(io, svc).await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("received shutdown signal, stopping server");
                break;
            }
        }
    }
}
