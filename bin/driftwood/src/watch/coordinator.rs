//! Rebuild coordination between the observer and the preview server.
//!
//! The coordinator is the only owner of the two pieces of mutable shared
//! state in the watch loop: the rebuild state and the live server handle.
//! It runs as a single owning task consuming debounced triggers, so no
//! lock is needed and two rebuild cycles can never overlap. Each cycle is
//! strictly ordered: the server is stopped before the renderer touches the
//! output tree, and restarted only after the render returns.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use driftwood_generator::Renderer;

use super::observer::ChangeEvent;
use crate::server::{PreviewServer, ServerHandle};

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    /// Serving, waiting for a trigger.
    Idle,
    /// A stop → render → restart cycle is in flight.
    Rebuilding,
    /// Terminal: the server is down and stays down.
    ShuttingDown,
}

/// Owns the preview server lifecycle and performs rebuild cycles.
pub struct RebuildCoordinator {
    server: PreviewServer,
    handle: Option<ServerHandle>,
    renderer: Arc<dyn Renderer>,
    state: RebuildState,
}

impl RebuildCoordinator {
    /// Create a coordinator owning an already-started server.
    pub fn new(server: PreviewServer, handle: ServerHandle, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            server,
            handle: Some(handle),
            renderer,
            state: RebuildState::Idle,
        }
    }

    /// Consume triggers until cancelled or the trigger source closes.
    ///
    /// On return the preview server is stopped and the state is
    /// `ShuttingDown`.
    pub async fn run(
        mut self,
        mut triggers: mpsc::Receiver<ChangeEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    self.finish().await;
                    return;
                }
                trigger = triggers.recv() => match trigger {
                    Some(trigger) => {
                        self.rebuild_cycle(trigger, &mut triggers, &shutdown).await;
                        if self.state == RebuildState::ShuttingDown {
                            return;
                        }
                    }
                    None => {
                        // Trigger source gone; treat as cancellation.
                        self.finish().await;
                        return;
                    }
                },
            }
        }
    }

    /// Run one stop → render → restart cycle, then at most one more for
    /// everything that arrived while the first was in flight.
    async fn rebuild_cycle(
        &mut self,
        trigger: ChangeEvent,
        triggers: &mut mpsc::Receiver<ChangeEvent>,
        shutdown: &watch::Receiver<bool>,
    ) {
        let mut next = Some(trigger);

        while let Some(trigger) = next.take() {
            self.transition(RebuildState::Rebuilding);
            info!(path = %trigger.path.display(), kind = ?trigger.kind, "rebuilding site");

            // The renderer mutates the output tree, so stop serving it
            // first. `stop` returns only once the accept loop has exited.
            if let Some(handle) = self.handle.take() {
                handle.stop().await;
            }

            // The render is synchronous and potentially long; run it on
            // the blocking pool. It is never interrupted mid-flight.
            let renderer = self.renderer.clone();
            match tokio::task::spawn_blocking(move || renderer.render()).await {
                Ok(Ok(stats)) => {
                    info!(
                        pages = stats.pages,
                        duration_ms = stats.duration_ms,
                        "rebuild succeeded"
                    );
                }
                Ok(Err(e)) => {
                    error!(error = %e, "rebuild failed, previous output left in place");
                }
                Err(e) => {
                    error!(error = %e, "render task panicked");
                }
            }

            if *shutdown.borrow() {
                // Cancelled mid-cycle: the render was allowed to finish
                // and the server stays down.
                self.transition(RebuildState::ShuttingDown);
                info!("shutdown requested during rebuild, not restarting server");
                return;
            }

            // Restart over whatever output tree the render left behind;
            // after a failure that is the last successful build.
            match self.server.start().await {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => error!(error = %e, "failed to restart preview server"),
            }
            self.transition(RebuildState::Idle);

            // Coalesce everything that arrived while we were busy into at
            // most one follow-up cycle.
            let mut pending = None;
            let mut extra = 0usize;
            while let Ok(queued) = triggers.try_recv() {
                if pending.is_some() {
                    extra += 1;
                }
                pending = Some(queued);
            }
            if extra > 0 {
                debug!(extra, "coalesced queued triggers into one follow-up rebuild");
            }
            next = pending;
        }
    }

    /// Stop the server and enter the terminal state.
    async fn finish(&mut self) {
        self.transition(RebuildState::ShuttingDown);
        if let Some(handle) = self.handle.take() {
            handle.stop().await;
        }
    }

    /// The single place state changes. `ShuttingDown` is absorbing.
    fn transition(&mut self, next: RebuildState) {
        if self.state == RebuildState::ShuttingDown && next != RebuildState::ShuttingDown {
            return;
        }
        debug!(from = ?self.state, to = ?next, "rebuild state transition");
        self.state = next;
    }
}
