//! Outcome observers.
//!
//! # Data Flow
//! ```text
//! Host HTTP client ─▶ http.rs (ObserveLayer, tower) ─┐
//!                                                     ├─▶ NetworkObserver::on_outcome
//! tracing ERROR events ─▶ logs.rs (LogObserverLayer) ─┘
//! ```
//!
//! # Design Decisions
//! - Explicit composition points instead of patching global functions
//! - Layers always chain to the inner service/subscriber
//! - Results and log events pass through unchanged

pub mod http;
pub mod logs;

use crate::detector::FailureSample;

/// Receives classified interaction outcomes.
pub trait NetworkObserver: Send + Sync + 'static {
    fn on_outcome(&self, sample: FailureSample);
}

pub use self::http::{Observe, ObserveLayer, TransportErrorClass};
pub use self::logs::LogObserverLayer;
