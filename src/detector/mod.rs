//! Connectivity failure detection subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP client outcome (observer::http)      ERROR log event (observer::logs)
//!     → FailureSample                           → FailureSample
//!              \                               /
//!               → monitor.rs (active? → classifier.rs: backend-relevant?)
//!               → state.rs (debounce, count, Quiet ⇄ Alerting)
//!               → AlertView published on a watch channel
//!               → admin API / CLI read the view, user confirms recovery
//! ```
//!
//! # Design Decisions
//! - Best-effort heuristic: false positives and negatives are tolerated
//! - Observers only; every observed result is passed on unchanged
//! - No internal retries; the detector only counts and signals

pub mod classifier;
pub mod monitor;
pub mod sample;
pub mod state;

pub use classifier::BackendMatcher;
pub use monitor::{ActivationGuard, AlertView, ConnectivityFailureDetector, DetectorError};
pub use sample::{FailureSample, Outcome};
pub use state::{AlertState, DetectorState, Effect, Thresholds};
