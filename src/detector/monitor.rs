//! The connectivity failure detector.
//!
//! # Responsibilities
//! - Classify observed outcomes as backend-relevant or not
//! - Drive the debounced failure counter and the alert state
//! - Publish the alert view after every mutation
//! - Gate the recovery action behind an explicit confirmation
//!
//! # Design Decisions
//! - No singleton: callers construct a detector and share it via `Arc`
//! - Counting only happens while an [`ActivationGuard`] is alive
//! - State transitions are logged after the lock is released, since the
//!   log observer may feed events back into the detector

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::watch;
use tower::BoxError;

use crate::config::DetectorConfig;
use crate::detector::classifier::BackendMatcher;
use crate::detector::sample::{FailureSample, Outcome};
use crate::detector::state::{AlertState, DetectorState, Effect, Thresholds};
use crate::observability::metrics;
use crate::observer::NetworkObserver;
use crate::recovery::{Confirmer, RecoveryAction, RecoveryOutcome, RecoveryPrompt};

/// Errors from detector lifecycle operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectorError {
    /// The detector already has a live activation guard.
    #[error("detector is already active")]
    AlreadyActive,
}

/// The state exposed to views and the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertView {
    pub state: AlertState,
    pub error_count: u32,
    pub visible: bool,
}

impl From<&DetectorState> for AlertView {
    fn from(state: &DetectorState) -> Self {
        Self {
            state: state.alert_state(),
            error_count: state.consecutive_failures,
            visible: state.visible,
        }
    }
}

impl Default for AlertView {
    fn default() -> Self {
        Self::from(&DetectorState::default())
    }
}

struct Settings {
    matcher: BackendMatcher,
    thresholds: Thresholds,
}

impl From<&DetectorConfig> for Settings {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            matcher: BackendMatcher::new(config),
            thresholds: Thresholds::from(config),
        }
    }
}

/// Detects bursts of backend connectivity failures.
pub struct ConnectivityFailureDetector {
    settings: ArcSwap<Settings>,
    state: Mutex<DetectorState>,
    active: AtomicBool,
    view_tx: watch::Sender<AlertView>,
    recovery: Arc<dyn RecoveryAction>,
}

impl ConnectivityFailureDetector {
    /// Create an inactive detector with the given recovery action.
    pub fn new(config: &DetectorConfig, recovery: Arc<dyn RecoveryAction>) -> Self {
        let (view_tx, _) = watch::channel(AlertView::default());
        Self {
            settings: ArcSwap::from_pointee(Settings::from(config)),
            state: Mutex::new(DetectorState::default()),
            active: AtomicBool::new(false),
            view_tx,
            recovery,
        }
    }

    /// Start counting. Counting stops when the returned guard is released.
    pub fn activate(self: &Arc<Self>) -> Result<ActivationGuard, DetectorError> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DetectorError::AlreadyActive)?;

        tracing::info!("Connectivity failure detector activated");
        Ok(ActivationGuard {
            detector: Some(self.clone()),
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Swap thresholds and patterns. Counters are kept.
    pub fn reconfigure(&self, config: &DetectorConfig) {
        self.settings.store(Arc::new(Settings::from(config)));
        tracing::info!(
            failure_threshold = config.failure_threshold,
            log_failure_threshold = config.log_failure_threshold,
            success_threshold = config.success_threshold,
            debounce_ms = config.debounce_ms,
            "Detector reconfigured"
        );
    }

    /// Current alert view.
    pub fn view(&self) -> AlertView {
        *self.view_tx.borrow()
    }

    /// Receive every published alert view.
    pub fn subscribe(&self) -> watch::Receiver<AlertView> {
        self.view_tx.subscribe()
    }

    /// Classify and count one observation.
    pub fn on_outcome(&self, sample: FailureSample) {
        if !self.is_active() {
            return;
        }

        let settings = self.settings.load();
        let relevant = match sample.outcome {
            Outcome::LoggedError => settings.matcher.matches_log(&sample.target),
            Outcome::Success | Outcome::TransportFailure => {
                settings.matcher.matches_target(&sample.target)
            }
        };
        metrics::record_sample(sample.outcome.as_str(), relevant);
        if !relevant {
            return;
        }

        let (effect, view) = {
            let mut state = self.state.lock().expect("detector state mutex poisoned");
            // Re-checked under the lock so a concurrent release always wins.
            if !self.is_active() {
                return;
            }
            let thresholds = &settings.thresholds;
            let effect = match sample.outcome {
                Outcome::Success => state.record_success(thresholds),
                Outcome::TransportFailure => state.record_transport_failure(sample.at, thresholds),
                Outcome::LoggedError => state.record_logged_error(sample.at, thresholds),
            };
            let view = AlertView::from(&*state);
            if effect.changes_view() {
                self.publish(view);
            }
            (effect, view)
        };

        match effect {
            Effect::Debounced => {
                metrics::record_debounced();
                tracing::trace!(
                    target_url = %sample.target,
                    "Failure within debounce interval dropped"
                );
            }
            Effect::SuccessCounted => {}
            Effect::Recovered => {
                tracing::info!("Backend connectivity restored, alert cleared");
            }
            Effect::FailureCounted { raised } => {
                metrics::record_failure_counted(sample.outcome.as_str());
                if raised {
                    tracing::warn!(
                        error_count = view.error_count,
                        path = %sample.outcome,
                        "Backend connectivity alert raised"
                    );
                } else {
                    tracing::debug!(
                        error_count = view.error_count,
                        path = %sample.outcome,
                        "Backend failure counted"
                    );
                }
            }
        }
    }

    /// Run the recovery action once the confirmer accepts the prompt.
    ///
    /// The prompt discloses the current error count. A declined prompt never
    /// reaches the action; an action failure is returned as-is.
    pub async fn recover(&self, confirmer: &dyn Confirmer) -> Result<RecoveryOutcome, BoxError> {
        let prompt = RecoveryPrompt {
            error_count: self.view().error_count,
        };
        if !confirmer.confirm(&prompt) {
            tracing::info!(error_count = prompt.error_count, "Recovery declined");
            metrics::record_recovery("declined");
            return Ok(RecoveryOutcome::Declined);
        }

        tracing::warn!(error_count = prompt.error_count, "Running recovery action");
        match self.recovery.recover().await {
            Ok(()) => {
                metrics::record_recovery("completed");
                Ok(RecoveryOutcome::Completed)
            }
            Err(e) => {
                metrics::record_recovery("failed");
                tracing::warn!(error = %e, "Recovery action failed");
                Err(e)
            }
        }
    }

    fn publish(&self, view: AlertView) {
        self.view_tx.send_replace(view);
        metrics::record_alert(view.visible, view.error_count);
    }

    fn release(&self) {
        self.active.store(false, Ordering::Release);
        let mut state = self.state.lock().expect("detector state mutex poisoned");
        state.reset();
        self.publish(AlertView::from(&*state));
        drop(state);
        tracing::info!("Connectivity failure detector deactivated");
    }
}

impl NetworkObserver for ConnectivityFailureDetector {
    fn on_outcome(&self, sample: FailureSample) {
        ConnectivityFailureDetector::on_outcome(self, sample);
    }
}

/// Scoped activation of a detector.
///
/// Released exactly once, either by [`ActivationGuard::deactivate`] or on drop.
pub struct ActivationGuard {
    detector: Option<Arc<ConnectivityFailureDetector>>,
}

impl ActivationGuard {
    pub fn deactivate(mut self) {
        if let Some(detector) = self.detector.take() {
            detector.release();
        }
    }
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        if let Some(detector) = self.detector.take() {
            detector.release();
        }
    }
}
