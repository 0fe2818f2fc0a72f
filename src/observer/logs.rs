//! tracing-subscriber layer reporting ERROR events as logged errors.
//!
//! Events are rendered roughly the way a console joins its arguments: the
//! target, then the message, then `name=value` for every other field.

use std::fmt::{self, Write};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::detector::FailureSample;
use crate::observer::NetworkObserver;

/// Targets whose events are never fed back into the detector.
const OWN_TARGETS: &[&str] = &[
    concat!(env!("CARGO_CRATE_NAME"), "::detector"),
    concat!(env!("CARGO_CRATE_NAME"), "::observer"),
];

pub struct LogObserverLayer {
    observer: Arc<dyn NetworkObserver>,
}

impl LogObserverLayer {
    pub fn new(observer: Arc<dyn NetworkObserver>) -> Self {
        Self { observer }
    }
}

impl<S: Subscriber> Layer<S> for LogObserverLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() != Level::ERROR {
            return;
        }
        if OWN_TARGETS.iter().any(|t| meta.target().starts_with(t)) {
            return;
        }

        let mut line = LineVisitor {
            line: meta.target().to_string(),
        };
        event.record(&mut line);
        self.observer.on_outcome(FailureSample::logged_error(line.line));
    }
}

struct LineVisitor {
    line: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            let _ = write!(self.line, " {value}");
        } else {
            let _ = write!(self.line, " {}={value}", field.name());
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let _ = write!(self.line, " {}={value}", field.name());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.line, " {value:?}");
        } else {
            let _ = write!(self.line, " {}={value:?}", field.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Outcome;
    use std::sync::Mutex;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl NetworkObserver for Recorder {
        fn on_outcome(&self, sample: FailureSample) {
            assert_eq!(sample.outcome, Outcome::LoggedError);
            self.lines.lock().unwrap().push(sample.target);
        }
    }

    #[test]
    fn test_only_error_events_are_observed() {
        let recorder = Arc::new(Recorder::default());
        let subscriber =
            tracing_subscriber::registry().with(LogObserverLayer::new(recorder.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("failed to fetch from firebase");
            tracing::error!(target: "app::sync", code = 7, "Failed to fetch from Firebase");
        });

        let lines = recorder.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("app::sync"));
        assert!(lines[0].contains("Failed to fetch from Firebase"));
        assert!(lines[0].contains("code=7"));
    }

    #[test]
    fn test_own_detector_events_are_skipped() {
        let recorder = Arc::new(Recorder::default());
        let subscriber =
            tracing_subscriber::registry().with(LogObserverLayer::new(recorder.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(
                target: concat!(env!("CARGO_CRATE_NAME"), "::detector::monitor"),
                "failed to fetch firebase"
            );
        });

        assert!(recorder.lines.lock().unwrap().is_empty());
    }
}
