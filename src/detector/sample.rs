//! Observed interaction outcomes.

use std::fmt;
use std::time::Instant;

/// What happened to an observed interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The network call completed with a success status.
    Success,
    /// The network call failed at the transport level (connect, reset, timeout).
    TransportFailure,
    /// A diagnostic error line was logged.
    LoggedError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::TransportFailure => "transport_failure",
            Outcome::LoggedError => "logged_error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single observation fed to the detector.
///
/// `target` is the request URL for network outcomes and the rendered log
/// line for logged errors.
#[derive(Debug, Clone)]
pub struct FailureSample {
    pub at: Instant,
    pub target: String,
    pub outcome: Outcome,
}

impl FailureSample {
    pub fn new(outcome: Outcome, target: impl Into<String>) -> Self {
        Self {
            at: Instant::now(),
            target: target.into(),
            outcome,
        }
    }

    pub fn success(url: impl Into<String>) -> Self {
        Self::new(Outcome::Success, url)
    }

    pub fn transport_failure(url: impl Into<String>) -> Self {
        Self::new(Outcome::TransportFailure, url)
    }

    pub fn logged_error(line: impl Into<String>) -> Self {
        Self::new(Outcome::LoggedError, line)
    }

    /// Override the observation time.
    pub fn at(mut self, at: Instant) -> Self {
        self.at = at;
        self
    }
}
