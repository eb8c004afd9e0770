//! Preview HTTP server for the development loop.
//!
//! The server's lifetime is modeled as an owned [`ServerHandle`] returned
//! from [`PreviewServer::start`] and consumed by [`ServerHandle::stop`], so
//! at most one live instance can exist per `PreviewServer`. `stop` does
//! not return until the serving task has fully exited and the listening
//! socket is released; an immediate `start` on the same address must
//! succeed.

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::Router;
use thiserror::Error;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time::timeout};
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

/// Preview server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// How a server stop completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// All in-flight requests drained within the grace period.
    Drained,
    /// The grace period elapsed and remaining connections were force-closed.
    Forced,
}

/// A stoppable static file server over the output directory.
#[derive(Debug)]
pub struct PreviewServer {
    addr: String,
    root: PathBuf,
    grace: Duration,
    requests: Arc<AtomicU64>,
}

impl PreviewServer {
    /// Create a server for `root`, to be bound at `addr` (`host:port`).
    pub fn new(addr: impl Into<String>, root: impl Into<PathBuf>, grace: Duration) -> Self {
        Self {
            addr: addr.into(),
            root: root.into(),
            grace,
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bind the configured address and start serving on a dedicated task.
    ///
    /// After the first successful bind the concrete address is pinned, so
    /// an `addr` with port 0 keeps its assigned port across restarts.
    pub async fn start(&mut self) -> Result<ServerHandle, ServerError> {
        let listener = TcpListener::bind(self.addr.as_str())
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: self.addr.clone(),
            source,
        })?;
        self.addr = local_addr.to_string();

        let requests = self.requests.clone();
        let app = Router::new()
            .fallback_service(ServeDir::new(&self.root))
            .layer(axum::middleware::from_fn(
                move |req: axum::extract::Request, next: axum::middleware::Next| {
                    let requests = requests.clone();
                    async move {
                        requests.fetch_add(1, Ordering::SeqCst);
                        next.run(req).await
                    }
                },
            ));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                // Per-request failures are handled inside the router; an
                // error here means the accept loop itself died.
                error!(error = %e, "preview server error");
            }
        });

        info!(addr = %local_addr, root = %self.root.display(), "preview server listening");

        Ok(ServerHandle {
            addr: local_addr,
            shutdown: shutdown_tx,
            task,
            grace: self.grace,
        })
    }

    /// Address the server binds, pinned to a concrete port after the
    /// first successful `start`.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Total requests accepted across all incarnations of this server.
    pub fn requests_accepted(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Shared request counter, for instrumentation.
    pub fn request_counter(&self) -> Arc<AtomicU64> {
        self.requests.clone()
    }
}

/// Owned handle to a running preview server instance.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    grace: Duration,
}

impl ServerHandle {
    /// The concrete bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections, drain in-flight requests for at most
    /// the grace period, then force-close whatever remains.
    ///
    /// Returns only after the serving task has fully exited, so the
    /// listening socket is guaranteed released when this returns.
    pub async fn stop(self) -> StopOutcome {
        let Self {
            addr,
            shutdown,
            mut task,
            grace,
        } = self;

        let _ = shutdown.send(());

        let outcome = match timeout(grace, &mut task).await {
            Ok(result) => {
                if let Err(e) = result {
                    debug!(error = %e, "preview server task ended abnormally");
                }
                StopOutcome::Drained
            }
            Err(_) => {
                warn!(%addr, grace_ms = grace.as_millis() as u64, "graceful drain exceeded grace period, forcing close");
                task.abort();
                let _ = (&mut task).await;
                StopOutcome::Forced
            }
        };

        info!(%addr, "preview server stopped");
        outcome
    }
}
