//! Status dashboard subsystem.
//!
//! # Data Flow
//! ```text
//! Host cache layer ──▶ cache.rs (CacheStatusSource) ──┐
//!                                                      ├─▶ view.rs (StatusDashboard)
//! Realtime listeners ─▶ realtime.rs (RealtimeFeed) ───┘        │
//!                                                              ▼
//!                                            DashboardSnapshot (admin API / CLI)
//! ```
//!
//! # Design Decisions
//! - Owns no state of its own; sources are re-queried after every command
//! - The cache layer's reserved `strategies` entry is never shown

pub mod cache;
pub mod realtime;
pub mod view;

pub use cache::{CacheDescriptor, CacheRegistry, CacheStatusSource};
pub use realtime::{EntityKind, RealtimeFeed, RealtimeUpdatesSource};
pub use view::{
    CollectionStatus, DashboardError, DashboardSnapshot, FetchStrategy, RealtimeSummary,
    StatusDashboard, StrategyMode, RESERVED_COLLECTION,
};
