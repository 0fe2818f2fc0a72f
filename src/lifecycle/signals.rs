//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT (Ctrl+C) and, on unix, SIGTERM
//! - Translate the first one into `Lifecycle::shutdown`
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A second signal while draining exits immediately

use std::sync::Arc;

use crate::lifecycle::Lifecycle;

/// Spawn the signal listener task.
pub fn spawn_signal_handler(lifecycle: Arc<Lifecycle>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::warn!(error = %e, "Failed to install signal handlers");
            return;
        }
        tracing::info!("Shutdown signal received");
        lifecycle.shutdown();

        if wait_for_signal().await.is_ok() {
            tracing::warn!("Second signal received, exiting immediately");
            std::process::exit(130);
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
