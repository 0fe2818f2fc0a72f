//! Realtime update tracking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// Kinds of entities announced by realtime listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Workers,
    Farms,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Workers => "workers",
            EntityKind::Farms => "farms",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "workers" => Ok(EntityKind::Workers),
            "farms" => Ok(EntityKind::Farms),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// Read/acknowledge access to newly arrived entities.
pub trait RealtimeUpdatesSource: Send + Sync {
    /// Ids seen since the last acknowledge, in arrival order.
    fn new_entities(&self, kind: EntityKind) -> Vec<String>;

    fn has_new_data(&self) -> bool;

    /// Clear both sequences and the "has new data" flag.
    fn acknowledge(&self);
}

#[derive(Debug, Default)]
struct FeedState {
    workers: Vec<String>,
    farms: Vec<String>,
}

impl FeedState {
    fn list_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Workers => &mut self.workers,
            EntityKind::Farms => &mut self.farms,
        }
    }
}

/// In-process feed of new entities.
#[derive(Debug, Default)]
pub struct RealtimeFeed {
    state: Mutex<FeedState>,
}

impl RealtimeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append newly seen ids. Ids already pending are not repeated.
    pub fn record<I>(&self, kind: EntityKind, ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut state = self.state.lock().expect("realtime feed mutex poisoned");
        let list = state.list_mut(kind);
        let before = list.len();
        for id in ids {
            if !list.contains(&id) {
                list.push(id);
            }
        }
        let added = list.len() - before;
        if added > 0 {
            tracing::debug!(kind = %kind, added, "Recorded realtime updates");
        }
        added
    }
}

impl RealtimeUpdatesSource for RealtimeFeed {
    fn new_entities(&self, kind: EntityKind) -> Vec<String> {
        let mut state = self.state.lock().expect("realtime feed mutex poisoned");
        state.list_mut(kind).clone()
    }

    fn has_new_data(&self) -> bool {
        let state = self.state.lock().expect("realtime feed mutex poisoned");
        !state.workers.is_empty() || !state.farms.is_empty()
    }

    fn acknowledge(&self) {
        let mut state = self.state.lock().expect("realtime feed mutex poisoned");
        *state = FeedState::default();
    }
}
