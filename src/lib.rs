//! Backend connectivity monitor.
//!
//! Watches outbound traffic to a backend service and ERROR-level log events,
//! raises a user-visible alert after a burst of failures, clears it once
//! traffic succeeds again, and offers a confirmation-gated emergency
//! recovery that wipes local state and restarts.
//!
//! ```text
//!   Client ──▶ http (forwarding server) ──▶ observer::ObserveLayer ──▶ Backend
//!                                                  │
//!   tracing ERROR events ──▶ observer::LogObserverLayer
//!                                                  │
//!                                                  ▼
//!                                  detector (Quiet ⇄ Alerting)
//!                                                  │
//!   Operator ──▶ admin API / monitor-cli ──────────┤
//!                    │                             ▼
//!                    └──▶ dashboard        recovery (confirm → reset → restart)
//! ```

// Core
pub mod config;
pub mod detector;
pub mod observer;
pub mod recovery;

// Surfaces
pub mod admin;
pub mod dashboard;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::MonitorConfig;
pub use detector::{AlertView, ConnectivityFailureDetector};
pub use http::HttpServer;
pub use lifecycle::{Application, Lifecycle};
