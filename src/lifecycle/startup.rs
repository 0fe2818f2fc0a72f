//! Startup orchestration.
//!
//! # Responsibilities
//! - Wire subsystems in dependency order (cache, realtime, recovery, detector)
//! - Activate the detector for the lifetime of one serving round
//! - Run the forwarding and admin listeners until a lifecycle event arrives
//!
//! # Design Decisions
//! - Shared state outlives restarts; a restart only re-runs `serve`
//! - Listeners start last (traffic only when the detector is counting)
//! - Every serving round holds exactly one activation guard

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{serve_admin, AdminState};
use crate::config::MonitorConfig;
use crate::dashboard::{CacheRegistry, FetchStrategy, RealtimeFeed, StatusDashboard};
use crate::detector::{ConnectivityFailureDetector, DetectorError};
use crate::http::HttpServer;
use crate::lifecycle::{wait_for_event, Lifecycle, LifecycleEvent};
use crate::recovery::{LocalStateReset, RecoveryTickets};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error("listener failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the monitor shares between its listeners.
pub struct Application {
    pub config: Arc<ArcSwap<MonitorConfig>>,
    pub lifecycle: Arc<Lifecycle>,
    pub cache: Arc<CacheRegistry>,
    pub realtime: Arc<RealtimeFeed>,
    pub dashboard: Arc<StatusDashboard>,
    pub tickets: Arc<RecoveryTickets>,
    pub detector: Arc<ConnectivityFailureDetector>,
}

impl Application {
    pub fn new(config: MonitorConfig) -> Self {
        let lifecycle = Arc::new(Lifecycle::new());
        let cache = Arc::new(CacheRegistry::from_config(&config.cache));
        let realtime = Arc::new(RealtimeFeed::new());
        let dashboard = Arc::new(StatusDashboard::new(
            cache.clone(),
            realtime.clone(),
            FetchStrategy::from_config(&config.cache),
        ));
        let tickets = Arc::new(RecoveryTickets::new(Duration::from_secs(
            config.recovery.ticket_ttl_secs,
        )));
        let recovery = Arc::new(LocalStateReset::new(
            cache.clone(),
            realtime.clone(),
            lifecycle.clone(),
        ));
        let detector = Arc::new(ConnectivityFailureDetector::new(&config.detector, recovery));

        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            lifecycle,
            cache,
            realtime,
            dashboard,
            tickets,
            detector,
        }
    }

    pub fn admin_state(&self) -> AdminState {
        AdminState {
            config: self.config.clone(),
            detector: self.detector.clone(),
            dashboard: self.dashboard.clone(),
            realtime: self.realtime.clone(),
            tickets: self.tickets.clone(),
        }
    }

    /// Apply a reloaded configuration.
    ///
    /// Detector thresholds, cache collections, fetch strategies and the
    /// ticket lifetime change immediately. Listener, upstream and admin
    /// settings take effect on the next serving round; observability
    /// settings only at process start.
    pub fn apply_config(&self, config: MonitorConfig) {
        self.detector.reconfigure(&config.detector);
        self.cache.reconfigure(&config.cache);
        self.dashboard.set_strategies(FetchStrategy::from_config(&config.cache));
        self.tickets.set_ttl(Duration::from_secs(config.recovery.ticket_ttl_secs));
        self.config.store(Arc::new(config));
    }

    /// Serve one round: activate the detector, run both listeners and return
    /// the lifecycle event that ended the round.
    pub async fn serve(
        &self,
        listener: TcpListener,
        admin_listener: Option<TcpListener>,
    ) -> Result<LifecycleEvent, ServeError> {
        let config = self.config.load_full();
        let events = self.lifecycle.subscribe();
        let forward_shutdown = self.lifecycle.subscribe();
        let admin_shutdown = self.lifecycle.subscribe();
        if self.lifecycle.is_shutdown_requested() {
            return Ok(LifecycleEvent::Shutdown);
        }
        let guard = self.detector.activate()?;

        let server = HttpServer::new(&config, self.detector.clone());
        let forward = tokio::spawn(async move {
            server
                .run(listener, async move {
                    wait_for_event(forward_shutdown).await;
                })
                .await
        });

        let admin = admin_listener.map(|admin_listener| {
            let state = self.admin_state();
            tokio::spawn(async move {
                serve_admin(admin_listener, state, async move {
                    wait_for_event(admin_shutdown).await;
                })
                .await
            })
        });

        let event = wait_for_event(events).await;
        tracing::info!(event = ?event, "Lifecycle event received, draining listeners");

        let forward_result = forward.await;
        let admin_result = match admin {
            Some(handle) => Some(handle.await),
            None => None,
        };
        guard.deactivate();

        for result in std::iter::once(forward_result).chain(admin_result) {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(e) => tracing::warn!(error = %e, "Listener task panicked"),
            }
        }
        Ok(event)
    }
}
