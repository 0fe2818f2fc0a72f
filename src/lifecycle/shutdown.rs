//! Shutdown and restart coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::broadcast;

/// A lifecycle request broadcast to long-running tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Stop everything and exit.
    Shutdown,
    /// Tear down servers and state, then start again.
    Restart,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("no task is listening for lifecycle events")]
    NoListeners,
}

/// Coordinator for graceful shutdown and in-process restart.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Lifecycle {
    tx: broadcast::Sender<LifecycleEvent>,
    shutdown_requested: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self {
            tx,
            shutdown_requested: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Request shutdown. Sticky, so a request made between serving rounds
    /// is still seen by the main loop.
    pub fn shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.tx.send(LifecycleEvent::Shutdown);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Ask the main loop to restart. Fails when nothing would act on it.
    pub fn restart(&self) -> Result<(), LifecycleError> {
        self.tx
            .send(LifecycleEvent::Restart)
            .map(|_| ())
            .map_err(|_| LifecycleError::NoListeners)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once any lifecycle event arrives (or the channel closes).
pub async fn wait_for_event(mut rx: broadcast::Receiver<LifecycleEvent>) -> LifecycleEvent {
    loop {
        match rx.recv().await {
            Ok(event) => return event,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return LifecycleEvent::Shutdown,
        }
    }
}
