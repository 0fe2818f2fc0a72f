//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Watches the parent directory, not the file: editors that save by
//!   renaming a temp file over the config replace the inode, and a watch on
//!   the old inode would never fire again
//! - Events are filtered by file name and coalesced; one save usually fires
//!   several events, and the file is loaded once the burst has settled
//! - Invalid files are logged and skipped, the running config stays

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::MonitorConfig;

const DEFAULT_SETTLE: Duration = Duration::from_millis(250);

/// Pushes every successfully reloaded configuration to a channel.
pub struct ConfigWatcher {
    path: PathBuf,
    settle: Duration,
    update_tx: mpsc::UnboundedSender<MonitorConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<MonitorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            settle: DEFAULT_SETTLE,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Quiet period that ends a burst of file events.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Start watching. Must be called inside a Tokio runtime; the returned
    /// watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_config(&event, &file_name) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = ?e, "Config watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tokio::spawn(reload_loop(self.path.clone(), self.settle, event_rx, self.update_tx));

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn touches_config(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

async fn reload_loop(
    path: PathBuf,
    settle: Duration,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<MonitorConfig>,
) {
    while events.recv().await.is_some() {
        loop {
            match tokio::time::timeout(settle, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        tracing::info!(path = ?path, "Config file change detected, reloading");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Config reload rejected, keeping current configuration")
            }
        }
    }
}
