//! Admin API subsystem.
//!
//! # Data Flow
//! ```text
//! Operator / monitor-cli
//!     → auth.rs (Bearer api_key, read from live config)
//!     → handlers.rs
//!         - detector view (status, alert)
//!         - dashboard (snapshot, cache clear, realtime record/ack)
//!         - recovery (issue ticket, redeem ticket)
//! ```
//!
//! # Design Decisions
//! - Separate listener from forwarded traffic, bound to localhost by default
//! - Recovery is two requests so the error count is always disclosed first

pub mod auth;
pub mod handlers;

use arc_swap::ArcSwap;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::config::MonitorConfig;
use crate::dashboard::{RealtimeFeed, StatusDashboard};
use crate::detector::ConnectivityFailureDetector;
use crate::recovery::RecoveryTickets;

/// Shared state behind every admin route.
#[derive(Clone)]
pub struct AdminState {
    pub config: Arc<ArcSwap<MonitorConfig>>,
    pub detector: Arc<ConnectivityFailureDetector>,
    pub dashboard: Arc<StatusDashboard>,
    pub realtime: Arc<RealtimeFeed>,
    pub tickets: Arc<RecoveryTickets>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/alert", get(get_alert))
        .route("/admin/dashboard", get(get_dashboard))
        .route("/admin/cache/clear", post(clear_cache))
        .route("/admin/cache/{collection}/clear", post(clear_collection))
        .route("/admin/realtime/ack", post(acknowledge_updates))
        .route("/admin/realtime/{kind}", post(record_updates))
        .route("/admin/recovery", get(issue_recovery_ticket))
        .route("/admin/recovery/{ticket}", post(redeem_recovery_ticket))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until `shutdown` resolves.
pub async fn serve_admin<F>(
    listener: TcpListener,
    state: AdminState,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "Admin API listening");
    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
