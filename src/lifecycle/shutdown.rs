//! Application-wide cancellation of tracking pipelines.

use tokio::sync::broadcast;

/// Coordinator for cancelling running pipelines.
///
/// Each pipeline that should stop on application shutdown subscribes once;
/// a single [`trigger`](Shutdown::trigger) reaches all of them.
#[derive(Debug, Clone)]
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

    /// Signal every subscriber. Returns the number of pipelines reached.
    pub fn trigger(&self) -> usize {
        let reached = self.tx.send(()).unwrap_or(0);
        tracing::info!(pipelines = reached, "Shutdown triggered");
        reached
    }

    /// Number of subscribers (pipelines still listening).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
