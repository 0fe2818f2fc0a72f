//! Hot reload through the config file watcher.
//!
//! Run with: cargo test --test config_reload

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use connectivity_monitor::config::{ConfigWatcher, MonitorConfig};

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("monitor-reload-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_text(failure_threshold: u32) -> String {
    format!("[detector]\nfailure_threshold = {failure_threshold}\n")
}

/// Save the way most editors do: write a temp file, rename it over the config.
fn atomic_save(path: &Path, failure_threshold: u32) {
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, config_text(failure_threshold)).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Wait for a reload carrying `failure_threshold`, skipping intermediate reads.
async fn expect_reload(updates: &mut UnboundedReceiver<MonitorConfig>, failure_threshold: u32) {
    let wait = async {
        while let Some(config) = updates.recv().await {
            if config.detector.failure_threshold == failure_threshold {
                return;
            }
        }
        panic!("watcher channel closed");
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("no reload with failure_threshold = {failure_threshold}"));
}

#[tokio::test]
async fn test_reload_survives_atomic_saves() {
    let dir = scratch_dir();
    let path = dir.join("monitor.toml");
    std::fs::write(&path, config_text(3)).unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.with_settle(Duration::from_millis(100)).run().unwrap();

    atomic_save(&path, 4);
    expect_reload(&mut updates, 4).await;

    atomic_save(&path, 5);
    expect_reload(&mut updates, 5).await;

    std::fs::write(&path, config_text(6)).unwrap();
    expect_reload(&mut updates, 6).await;

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_invalid_save_keeps_watching() {
    let dir = scratch_dir();
    let path = dir.join("monitor.toml");
    std::fs::write(&path, config_text(3)).unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.with_settle(Duration::from_millis(100)).run().unwrap();

    // Zero thresholds fail validation and are never published.
    atomic_save(&path, 0);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(updates.try_recv().is_err());

    atomic_save(&path, 7);
    expect_reload(&mut updates, 7).await;

    let _ = std::fs::remove_dir_all(&dir);
}
