//! Acceptor: binds the listener and spawns one driver per connection.
//!
//! # Responsibilities
//! - Bind the bounded listener
//! - Register each accepted connection with the tracker
//! - Spawn a connection driver task with fresh collaborators
//! - Stop accepting on shutdown and drain live connections

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::connection::{ConnectionDriver, ConnectionTracker};
use crate::exchange::{BodyFraming, Dispatch, HeaderParser};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// The server: a listener plus the per-connection machinery.
pub struct Server {
    config: ServerConfig,
    tracker: ConnectionTracker,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tracker: ConnectionTracker::new(),
        }
    }

    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections until the shutdown signal arrives, then drain.
    ///
    /// `make_exchange` builds a fresh parser/framer/dispatch triple for
    /// every accepted connection.
    pub async fn run<F, H, B, D>(
        &self,
        make_exchange: F,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError>
    where
        F: Fn() -> (H, B, D) + Send + Sync,
        H: HeaderParser + Send + 'static,
        B: BodyFraming<Request = H::Request> + Send + 'static,
        D: Dispatch<Request = H::Request, Body = B::Body> + Send + 'static,
        H::Request: Send + 'static,
        B::Body: Send + 'static,
    {
        let listener = Listener::bind(&self.config.listener).await?;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr, permit) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    // The guard keeps the live count honest even if a
                    // collaborator panics inside the spawned task.
                    let guard = self.tracker.track();
                    let id = guard.id();
                    metrics::record_connection_accepted();
                    tracing::debug!(connection_id = %id, peer_addr = %peer_addr, "Connection registered");

                    let (parser, framer, dispatch) = make_exchange();
                    let driver = ConnectionDriver::new(
                        id,
                        stream,
                        parser,
                        framer,
                        dispatch,
                        Arc::new(self.tracker.clone()),
                        self.config.timeouts.clone(),
                        self.config.limits.clone(),
                    );

                    tokio::spawn(async move {
                        // Held for the connection's lifetime: the permit
                        // releases the listener slot and the guard releases
                        // the live count when the task ends, however it ends.
                        let _permit = permit;
                        let _guard = guard;
                        let _ = driver.begin().await;
                    });
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(
            active = self.tracker.active_count(),
            "Accept loop stopped, draining connections"
        );
        self.tracker.drained().await;
        Ok(())
    }
}
