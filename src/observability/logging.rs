//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Stack the log observer so ERROR events reach the detector
//! - Configure log level from config, overridable by `RUST_LOG`

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::observer::{LogObserverLayer, NetworkObserver};

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!(
        "{level},connectivity_monitor={level},tower_http={level}",
        level = config.log_level
    )
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(
    config: &ObservabilityConfig,
    observer: Arc<dyn NetworkObserver>,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(config))),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(LogObserverLayer::new(observer))
        .try_init()
}
