//! Read-only dashboard over cache and realtime state.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{CacheConfig, CacheStorage};
use crate::dashboard::cache::CacheStatusSource;
use crate::dashboard::realtime::{EntityKind, RealtimeUpdatesSource};

/// Collection name the cache layer uses for its own bookkeeping.
pub const RESERVED_COLLECTION: &str = "strategies";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("unknown cache collection: {0}")]
    UnknownCollection(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub name: String,
    /// False when the cache layer reports no descriptor for the collection.
    pub configured: bool,
    pub enabled: bool,
    pub storage: Option<CacheStorage>,
    pub expiry_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RealtimeSummary {
    pub new_workers: usize,
    pub new_farms: usize,
    pub total_new: usize,
    pub has_new_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyMode {
    Realtime,
    CacheOnDemand,
}

/// How a collection is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchStrategy {
    pub collection: String,
    pub mode: StrategyMode,
    pub detail: String,
}

impl FetchStrategy {
    /// Static description derived from the cache configuration.
    pub fn from_config(config: &CacheConfig) -> Vec<Self> {
        let realtime = config.realtime.iter().map(|name| FetchStrategy {
            collection: name.clone(),
            mode: StrategyMode::Realtime,
            detail: "live updates".to_string(),
        });
        let cached = config
            .collections
            .iter()
            .filter(|c| c.enabled && c.name != RESERVED_COLLECTION)
            .map(|c| FetchStrategy {
                collection: c.name.clone(),
                mode: StrategyMode::CacheOnDemand,
                detail: format!("{}min, {}", c.expiry_minutes, storage_label(c.storage)),
            });
        realtime.chain(cached).collect()
    }
}

fn storage_label(storage: CacheStorage) -> &'static str {
    match storage {
        CacheStorage::Session => "session",
        CacheStorage::Local => "local",
        CacheStorage::None => "none",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub collections: Vec<CollectionStatus>,
    pub realtime: RealtimeSummary,
    pub strategies: Vec<FetchStrategy>,
}

/// Pure view over externally owned cache and realtime state.
///
/// Every mutating command re-queries the sources and returns a fresh snapshot.
pub struct StatusDashboard {
    cache: Arc<dyn CacheStatusSource>,
    realtime: Arc<dyn RealtimeUpdatesSource>,
    strategies: ArcSwap<Vec<FetchStrategy>>,
}

impl StatusDashboard {
    pub fn new(
        cache: Arc<dyn CacheStatusSource>,
        realtime: Arc<dyn RealtimeUpdatesSource>,
        strategies: Vec<FetchStrategy>,
    ) -> Self {
        Self {
            cache,
            realtime,
            strategies: ArcSwap::from_pointee(strategies),
        }
    }

    /// Swap the fetch strategies after a cache configuration reload.
    pub fn set_strategies(&self, strategies: Vec<FetchStrategy>) {
        self.strategies.store(Arc::new(strategies));
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let collections = self
            .cache
            .cache_status()
            .into_iter()
            .filter(|(name, _)| name != RESERVED_COLLECTION)
            .map(|(name, descriptor)| CollectionStatus {
                name,
                configured: descriptor.is_some(),
                enabled: descriptor.map(|d| d.enabled).unwrap_or(false),
                storage: descriptor.filter(|d| d.enabled).map(|d| d.storage),
                expiry_minutes: descriptor.filter(|d| d.enabled).map(|d| d.expiry_minutes),
            })
            .collect();

        let new_workers = self.realtime.new_entities(EntityKind::Workers).len();
        let new_farms = self.realtime.new_entities(EntityKind::Farms).len();

        DashboardSnapshot {
            collections,
            realtime: RealtimeSummary {
                new_workers,
                new_farms,
                total_new: new_workers + new_farms,
                has_new_data: self.realtime.has_new_data(),
            },
            strategies: self.strategies.load().as_ref().clone(),
        }
    }

    pub fn clear_all_cache(&self) -> DashboardSnapshot {
        self.cache.clear_all();
        self.snapshot()
    }

    pub fn clear_collection_cache(&self, name: &str) -> Result<DashboardSnapshot, DashboardError> {
        if name == RESERVED_COLLECTION || !self.cache.clear_collection(name) {
            return Err(DashboardError::UnknownCollection(name.to_string()));
        }
        Ok(self.snapshot())
    }

    pub fn acknowledge_updates(&self) -> DashboardSnapshot {
        self.realtime.acknowledge();
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::cache::{CacheDescriptor, CacheRegistry};
    use crate::dashboard::realtime::RealtimeFeed;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Cache source that also reports the reserved bookkeeping collection.
    #[derive(Default)]
    struct ScriptedCache {
        cleared: Mutex<Vec<String>>,
    }

    impl CacheStatusSource for ScriptedCache {
        fn cache_status(&self) -> BTreeMap<String, Option<CacheDescriptor>> {
            let mut map = BTreeMap::new();
            map.insert(RESERVED_COLLECTION.to_string(), None);
            map.insert(
                "workers".to_string(),
                Some(CacheDescriptor {
                    enabled: true,
                    storage: CacheStorage::Session,
                    expiry_minutes: 30,
                }),
            );
            map.insert(
                "rooms".to_string(),
                Some(CacheDescriptor {
                    enabled: false,
                    storage: CacheStorage::Session,
                    expiry_minutes: 45,
                }),
            );
            map
        }

        fn clear_all(&self) {
            self.cleared.lock().unwrap().push("*".to_string());
        }

        fn clear_collection(&self, name: &str) -> bool {
            self.cleared.lock().unwrap().push(name.to_string());
            true
        }
    }

    fn dashboard_with(cache: Arc<dyn CacheStatusSource>) -> (StatusDashboard, Arc<RealtimeFeed>) {
        let feed = Arc::new(RealtimeFeed::new());
        let dashboard = StatusDashboard::new(
            cache,
            feed.clone(),
            FetchStrategy::from_config(&CacheConfig::default()),
        );
        (dashboard, feed)
    }

    #[test]
    fn test_snapshot_filters_reserved_collection() {
        let (dashboard, _) = dashboard_with(Arc::new(ScriptedCache::default()));
        let snapshot = dashboard.snapshot();

        let names: Vec<_> = snapshot.collections.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["rooms", "workers"]);

        let rooms = &snapshot.collections[0];
        assert!(rooms.configured);
        assert!(!rooms.enabled);
        assert_eq!(rooms.storage, None);

        let workers = &snapshot.collections[1];
        assert_eq!(workers.storage, Some(CacheStorage::Session));
        assert_eq!(workers.expiry_minutes, Some(30));
    }

    #[test]
    fn test_reserved_collection_cannot_be_cleared() {
        let cache = Arc::new(ScriptedCache::default());
        let (dashboard, _) = dashboard_with(cache.clone());

        assert_eq!(
            dashboard.clear_collection_cache(RESERVED_COLLECTION),
            Err(DashboardError::UnknownCollection(RESERVED_COLLECTION.to_string()))
        );
        assert!(cache.cleared.lock().unwrap().is_empty());
    }

    #[test]
    fn test_commands_requery_sources() {
        let registry = Arc::new(CacheRegistry::from_config(&CacheConfig::default()));
        let (dashboard, feed) = dashboard_with(registry.clone());

        feed.record(EntityKind::Workers, vec!["w1".into()]);
        feed.record(EntityKind::Farms, vec!["f1".into(), "f2".into()]);
        let snapshot = dashboard.snapshot();
        assert_eq!(snapshot.realtime.total_new, 3);
        assert!(snapshot.realtime.has_new_data);

        let snapshot = dashboard.acknowledge_updates();
        assert_eq!(snapshot.realtime.total_new, 0);
        assert!(!snapshot.realtime.has_new_data);

        dashboard.clear_collection_cache("farms").unwrap();
        assert_eq!(registry.generation("farms"), Some(1));
        dashboard.clear_all_cache();
        assert_eq!(registry.generation("farms"), Some(2));

        assert_eq!(
            dashboard.clear_collection_cache("nope"),
            Err(DashboardError::UnknownCollection("nope".into()))
        );
    }

    #[test]
    fn test_strategies_from_config() {
        let strategies = FetchStrategy::from_config(&CacheConfig::default());
        assert_eq!(strategies[0].collection, "notifications");
        assert_eq!(strategies[0].mode, StrategyMode::Realtime);
        assert!(strategies
            .iter()
            .any(|s| s.collection == "farms" && s.detail == "60min, local"));
    }

    #[test]
    fn test_set_strategies_shows_in_next_snapshot() {
        let (dashboard, _) = dashboard_with(Arc::new(ScriptedCache::default()));
        let mut config = CacheConfig::default();
        config.realtime.clear();
        config.collections.retain(|c| c.name == "rooms");

        dashboard.set_strategies(FetchStrategy::from_config(&config));
        let strategies = dashboard.snapshot().strategies;
        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].collection, "rooms");
        assert_eq!(strategies[0].mode, StrategyMode::CacheOnDemand);
    }
}
