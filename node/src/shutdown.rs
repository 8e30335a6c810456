//! Cooperative shutdown for the node's long-lived tasks.

use tokio::sync::broadcast;

/// Fans one shutdown signal out to the listener and driver loops.
///
/// Each loop holds a receiver from [`subscribe`](Self::subscribe) and
/// `select!`s on it alongside its own work. [`shutdown`](Self::shutdown) is
/// triggered by the daemon when its command loop ends (or by tests tearing a
/// node down); every receiver observes it once.
pub struct ShutdownController {
    tx: broadcast::Sender<()>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Notify every subscribed task. Safe to call with no subscribers.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
