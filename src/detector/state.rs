//! Failure counter state machine.
//!
//! # States
//! - Quiet: recovery affordance hidden
//! - Alerting: recovery affordance shown with a live error count
//!
//! # State Transitions
//! ```text
//! Quiet → Alerting: consecutive_failures >= failure threshold of the path
//!                   (transport: failure_threshold, logs: log_failure_threshold)
//! Alerting → Quiet: consecutive_successes >= success_threshold
//!                   (both counters reset)
//! ```
//!
//! # Design Decisions
//! - Pure: callers pass the observation time, nothing reads a clock here
//! - Transport failures closer than the debounce interval are dropped
//! - Logged errors skip the debounce unless configured otherwise
//! - A counted failure resets the success streak

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::DetectorConfig;

/// Visible state of the recovery affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertState {
    Quiet,
    Alerting,
}

/// Counting rules, derived from [`DetectorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thresholds {
    pub debounce: Duration,
    pub failure: u32,
    pub log_failure: u32,
    pub success: u32,
    pub debounce_logged_errors: bool,
}

impl From<&DetectorConfig> for Thresholds {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            failure: config.failure_threshold,
            log_failure: config.log_failure_threshold,
            success: config.success_threshold,
            debounce_logged_errors: config.debounce_logged_errors,
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

/// Result of applying one relevant observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Failure dropped by the debounce interval.
    Debounced,
    /// Success counted, no state change.
    SuccessCounted,
    /// Success threshold reached while alerting; everything reset.
    Recovered,
    /// Failure counted. `raised` is true on the Quiet → Alerting edge.
    FailureCounted { raised: bool },
}

impl Effect {
    /// Whether the observable view (count, visibility) may have changed.
    pub fn changes_view(&self) -> bool {
        matches!(self, Effect::Recovered | Effect::FailureCounted { .. })
    }
}

/// Counters driving the alert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorState {
    pub consecutive_failures: u32,
    pub last_failure_at: Option<Instant>,
    pub consecutive_successes: u32,
    pub visible: bool,
}

impl DetectorState {
    pub fn alert_state(&self) -> AlertState {
        if self.visible {
            AlertState::Alerting
        } else {
            AlertState::Quiet
        }
    }

    pub fn record_success(&mut self, thresholds: &Thresholds) -> Effect {
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        if self.visible && self.consecutive_successes >= thresholds.success {
            self.reset();
            Effect::Recovered
        } else {
            Effect::SuccessCounted
        }
    }

    pub fn record_transport_failure(&mut self, at: Instant, thresholds: &Thresholds) -> Effect {
        if self.within_debounce(at, thresholds.debounce) {
            return Effect::Debounced;
        }
        self.count_failure(Some(at), thresholds.failure)
    }

    pub fn record_logged_error(&mut self, at: Instant, thresholds: &Thresholds) -> Effect {
        if !thresholds.debounce_logged_errors {
            return self.count_failure(None, thresholds.log_failure);
        }
        if self.within_debounce(at, thresholds.debounce) {
            return Effect::Debounced;
        }
        self.count_failure(Some(at), thresholds.log_failure)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn within_debounce(&self, at: Instant, debounce: Duration) -> bool {
        match self.last_failure_at {
            // Out-of-order timestamps saturate to zero and are dropped too.
            Some(last) => at.saturating_duration_since(last) < debounce,
            None => false,
        }
    }

    fn count_failure(&mut self, at: Option<Instant>, threshold: u32) -> Effect {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
        if at.is_some() {
            self.last_failure_at = at;
        }

        let was_visible = self.visible;
        if self.consecutive_failures >= threshold {
            self.visible = true;
        }
        Effect::FailureCounted {
            raised: !was_visible && self.visible,
        }
    }
}
