//! Shutdown coordination for the proxy.
//!
//! # Data Flow
//! ```text
//! SIGINT / SIGTERM (signals.rs)
//!     → Shutdown::trigger
//!     → HttpServer::run: stop accepting, drain in-flight Grafana calls
//!     → reload task: leave its loop, later config updates are dropped
//! ```

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// `HttpServer::run` takes one receiver and resubscribes it for the reload
/// task. On trigger the server finishes the requests already forwarded to
/// Grafana before returning, and the reload task stops swapping clients so
/// a config change during the drain cannot replace the client mid-flight.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. A no-op when nobody is subscribed yet.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
