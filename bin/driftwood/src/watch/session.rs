//! Top-level driver for the watch-rebuild-serve loop.
//!
//! Owns startup ordering and teardown. The preview server is bound before
//! the observer is constructed, so a bind failure aborts the session
//! without ever touching the filesystem watch; teardown runs strictly
//! observer → coordinator → server so no trigger can arrive for a
//! coordinator that is already gone.

use std::{future::Future, sync::Arc};

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use driftwood_generator::Renderer;

use super::{coordinator::RebuildCoordinator, observer::ChangeObserver, ServeError, WatchConfig};
use crate::server::PreviewServer;

/// One development-server session: observer, coordinator, preview server.
pub struct WatchSession {
    config: WatchConfig,
    renderer: Arc<dyn Renderer>,
}

impl WatchSession {
    /// Create a session over an immutable configuration.
    pub fn new(config: WatchConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    /// Run until `interrupt` resolves, then tear down in order.
    ///
    /// Only the first resolution of the interrupt is acted on; firing the
    /// underlying signal again during teardown has no further effect.
    pub async fn run(self, interrupt: impl Future<Output = ()>) -> Result<(), ServeError> {
        if !self.config.watch_dir.is_dir() {
            return Err(ServeError::WatchSetup(self.config.watch_dir.clone()));
        }

        // Bind first: a bind failure must abort the session before the
        // observer exists.
        let mut server = PreviewServer::new(
            self.config.bind_addr.clone(),
            self.config.output_dir.clone(),
            self.config.grace,
        );
        let handle = server.start().await?;

        let (trigger_tx, trigger_rx) = mpsc::channel(64);
        let observer = ChangeObserver::start(&self.config, trigger_tx)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let coordinator = RebuildCoordinator::new(server, handle, self.renderer);
        let coordinator_task = tokio::spawn(coordinator.run(trigger_rx, shutdown_rx));

        interrupt.await;
        info!("interrupt received, shutting down");

        // Stop the observer before the coordinator so no trigger can
        // arrive once cancellation is in progress.
        observer.stop().await;
        let _ = shutdown_tx.send(true);
        if let Err(e) = coordinator_task.await {
            error!(error = %e, "coordinator task failed");
        }

        info!("shutdown complete");
        Ok(())
    }

    /// Run until Ctrl+C.
    pub async fn run_until_interrupted(self) -> Result<(), ServeError> {
        self.run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for interrupt signal");
            }
        })
        .await
    }
}
