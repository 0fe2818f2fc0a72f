//! Cache status surface.
//!
//! The cache engine itself lives in the host application; this module only
//! models what the dashboard reads from it and the two commands it sends.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::config::{CacheConfig, CacheStorage};

/// Per-collection cache settings as reported by the cache layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDescriptor {
    pub enabled: bool,
    pub storage: CacheStorage,
    pub expiry_minutes: u32,
}

/// Read/clear access to the host's cache layer.
pub trait CacheStatusSource: Send + Sync {
    /// Collection name → descriptor; `None` for collections without a cache.
    fn cache_status(&self) -> BTreeMap<String, Option<CacheDescriptor>>;

    fn clear_all(&self);

    /// Returns false if the collection is unknown.
    fn clear_collection(&self, name: &str) -> bool;
}

#[derive(Debug, Clone)]
struct Entry {
    descriptor: Option<CacheDescriptor>,
    generation: u64,
}

/// Config-backed registry of cached collections.
///
/// Clearing bumps a per-collection generation that cache owners compare
/// against to drop their entries.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    entries: DashMap<String, Entry>,
}

fn descriptors(config: &CacheConfig) -> HashMap<String, Option<CacheDescriptor>> {
    let realtime = config.realtime.iter().map(|name| (name.clone(), None));
    let cached = config.collections.iter().map(|c| {
        let descriptor = CacheDescriptor {
            enabled: c.enabled,
            storage: c.storage,
            expiry_minutes: c.expiry_minutes,
        };
        (c.name.clone(), Some(descriptor))
    });
    // A collection listed in both places reports its cache settings.
    realtime.chain(cached).collect()
}

impl CacheRegistry {
    pub fn from_config(config: &CacheConfig) -> Self {
        let registry = Self::default();
        registry.reconfigure(config);
        registry
    }

    /// Replace the collection set. Collections that survive keep their
    /// generation so owners don't drop entries on a reload; removed ones
    /// disappear from the status.
    pub fn reconfigure(&self, config: &CacheConfig) {
        let next = descriptors(config);
        self.entries.retain(|name, _| next.contains_key(name));
        for (name, descriptor) in next {
            self.entries
                .entry(name)
                .and_modify(|e| e.descriptor = descriptor)
                .or_insert(Entry { descriptor, generation: 0 });
        }
        tracing::debug!(collections = self.entries.len(), "Cache registry configured");
    }

    /// Current clear generation of a collection.
    pub fn generation(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|e| e.generation)
    }
}

impl CacheStatusSource for CacheRegistry {
    fn cache_status(&self) -> BTreeMap<String, Option<CacheDescriptor>> {
        self.entries
            .iter()
            .map(|r| (r.key().clone(), r.value().descriptor))
            .collect()
    }

    fn clear_all(&self) {
        for mut entry in self.entries.iter_mut() {
            entry.generation += 1;
        }
        tracing::info!(collections = self.entries.len(), "Cleared all cached collections");
    }

    fn clear_collection(&self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(mut entry) => {
                entry.generation += 1;
                tracing::info!(collection = %name, "Cleared cached collection");
                true
            }
            None => false,
        }
    }
}
