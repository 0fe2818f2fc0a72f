//! Emergency recovery subsystem.
//!
//! # Data Flow
//! ```text
//! Alerting view shown
//!     → user asks for recovery
//!     → RecoveryPrompt (discloses current error count)
//!     → Confirmer says yes/no
//!         - stdin prompt (CLI)
//!         - two-step ticket (admin API: issue, then redeem)
//!     → detector.recover() → RecoveryAction (clear local state, restart)
//! ```
//!
//! # Design Decisions
//! - Never automatic: the action only runs behind a confirmation
//! - Irreversible, so no retries; action errors go back to the caller as-is

pub mod action;
pub mod confirm;
pub mod tickets;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use tower::BoxError;

pub use action::LocalStateReset;
pub use confirm::StdinConfirmer;
pub use tickets::{ConfirmedTicket, IssuedTicket, RecoveryTickets, TicketError};

/// Clears all local state and restarts the application.
pub trait RecoveryAction: Send + Sync {
    fn recover(&self) -> BoxFuture<'_, Result<(), BoxError>>;
}

/// A blocking yes/no decision shown before recovery runs.
pub trait Confirmer: Send + Sync {
    fn confirm(&self, prompt: &RecoveryPrompt) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&RecoveryPrompt) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &RecoveryPrompt) -> bool {
        self(prompt)
    }
}

/// What the user is asked before recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPrompt {
    pub error_count: u32,
}

impl fmt::Display for RecoveryPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EMERGENCY RECOVERY\n\n{} connection errors detected.\n\n\
             This will clear all cached data and restart the application.\n\nContinue?",
            self.error_count
        )
    }
}

/// How a recovery request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    Declined,
    Completed,
}
