//! Two-step recovery confirmation for the admin API.
//!
//! `issue` shows the prompt (with the error count) and hands out a ticket;
//! only redeeming that ticket, once and before it expires, confirms. The
//! confirmation holds only while the error count still equals the one that
//! was disclosed.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use uuid::Uuid;

use crate::recovery::{Confirmer, RecoveryPrompt};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("unknown or already redeemed recovery ticket")]
    Unknown,

    #[error("recovery ticket expired")]
    Expired,
}

/// What the caller sees when a ticket is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedTicket {
    pub ticket: Uuid,
    pub error_count: u32,
    pub message: String,
    pub expires_in_secs: u64,
}

impl IssuedTicket {
    /// The prompt this ticket disclosed.
    pub fn prompt(&self) -> RecoveryPrompt {
        RecoveryPrompt {
            error_count: self.error_count,
        }
    }
}

/// Proof that a disclosed prompt was accepted.
#[derive(Debug)]
pub struct ConfirmedTicket {
    prompt: RecoveryPrompt,
}

impl ConfirmedTicket {
    /// The prompt that was shown when the ticket was issued.
    pub fn prompt(&self) -> RecoveryPrompt {
        self.prompt
    }
}

impl Confirmer for ConfirmedTicket {
    fn confirm(&self, prompt: &RecoveryPrompt) -> bool {
        if prompt.error_count != self.prompt.error_count {
            tracing::info!(
                disclosed = self.prompt.error_count,
                current = prompt.error_count,
                "Error count changed since the recovery prompt was shown, declining"
            );
            return false;
        }
        true
    }
}

/// Outstanding recovery tickets.
pub struct RecoveryTickets {
    ttl_ms: AtomicU64,
    pending: DashMap<Uuid, (RecoveryPrompt, Instant)>,
}

impl RecoveryTickets {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: AtomicU64::new(ttl.as_millis() as u64),
            pending: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.load(Ordering::Relaxed))
    }

    /// Applies to tickets already pending as well as new ones.
    pub fn set_ttl(&self, ttl: Duration) {
        self.ttl_ms.store(ttl.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn issue(&self, prompt: RecoveryPrompt) -> IssuedTicket {
        self.purge_expired();
        let ticket = Uuid::new_v4();
        self.pending.insert(ticket, (prompt, Instant::now()));

        IssuedTicket {
            ticket,
            error_count: prompt.error_count,
            message: prompt.to_string(),
            expires_in_secs: self.ttl().as_secs(),
        }
    }

    /// Consume a ticket. A ticket can be redeemed at most once.
    pub fn redeem(&self, ticket: Uuid) -> Result<ConfirmedTicket, TicketError> {
        let (_, (prompt, issued_at)) = self.pending.remove(&ticket).ok_or(TicketError::Unknown)?;
        if issued_at.elapsed() > self.ttl() {
            return Err(TicketError::Expired);
        }
        Ok(ConfirmedTicket { prompt })
    }

    pub fn purge_expired(&self) {
        let ttl = self.ttl();
        self.pending.retain(|_, (_, issued_at)| issued_at.elapsed() <= ttl);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
