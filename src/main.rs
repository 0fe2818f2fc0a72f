//! Connectivity monitor service.
//!
//! Forwards traffic to the configured backend, counts connectivity failures
//! and serves the admin API. Runs serving rounds until shutdown; a recovery
//! restart ends the current round and starts a fresh one.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use connectivity_monitor::config::{load_config, ConfigWatcher, MonitorConfig};
use connectivity_monitor::detector::BackendMatcher;
use connectivity_monitor::lifecycle::{spawn_signal_handler, Application, LifecycleEvent};
use connectivity_monitor::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "connectivity-monitor")]
#[command(about = "Backend connectivity failure monitor", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };

    let app = Arc::new(Application::new(config.clone()));
    logging::init_logging(&config.observability, app.detector.clone())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "connectivity-monitor starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        failure_threshold = config.detector.failure_threshold,
        success_threshold = config.detector.success_threshold,
        "Configuration loaded"
    );

    if !BackendMatcher::new(&config.detector).matches_target(&config.upstream.base_url) {
        tracing::warn!(
            upstream = %config.upstream.base_url,
            "Upstream does not match any backend pattern; forwarded failures will not be counted"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::warn!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload: detector thresholds and patterns, admin key.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let app = app.clone();
            tokio::spawn(async move {
                while let Some(config) = updates.recv().await {
                    app.apply_config(config);
                }
            });
            Some(watcher.run()?)
        }
        None => None,
    };

    spawn_signal_handler(app.lifecycle.clone());

    loop {
        let config = app.config.load_full();
        let listener = TcpListener::bind(&config.listener.bind_address).await?;
        let admin_listener = if config.admin.enabled {
            Some(TcpListener::bind(&config.admin.bind_address).await?)
        } else {
            None
        };

        match app.serve(listener, admin_listener).await? {
            LifecycleEvent::Shutdown => break,
            LifecycleEvent::Restart => {
                if app.lifecycle.is_shutdown_requested() {
                    break;
                }
                if let Some(path) = &args.config {
                    match load_config(path) {
                        Ok(config) => app.apply_config(config),
                        Err(e) => tracing::warn!(error = %e, "Keeping previous configuration"),
                    }
                }
                tracing::info!("Restarting with fresh local state");
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
