//! The emergency recovery action.

use futures_util::future::BoxFuture;
use std::sync::Arc;
use tower::BoxError;

use crate::dashboard::{CacheStatusSource, RealtimeUpdatesSource};
use crate::lifecycle::Lifecycle;
use crate::recovery::RecoveryAction;

/// Wipes every cached collection, drops pending realtime updates and asks
/// the main loop to restart.
pub struct LocalStateReset {
    cache: Arc<dyn CacheStatusSource>,
    realtime: Arc<dyn RealtimeUpdatesSource>,
    lifecycle: Arc<Lifecycle>,
}

impl LocalStateReset {
    pub fn new(
        cache: Arc<dyn CacheStatusSource>,
        realtime: Arc<dyn RealtimeUpdatesSource>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self { cache, realtime, lifecycle }
    }
}

impl RecoveryAction for LocalStateReset {
    fn recover(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async move {
            self.cache.clear_all();
            self.realtime.acknowledge();
            self.lifecycle.restart()?;
            tracing::warn!("Local state cleared, restart requested");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::dashboard::{CacheRegistry, EntityKind, RealtimeFeed};
    use crate::lifecycle::{wait_for_event, LifecycleEvent};

    fn fixture() -> (Arc<CacheRegistry>, Arc<RealtimeFeed>, Arc<Lifecycle>) {
        (
            Arc::new(CacheRegistry::from_config(&CacheConfig::default())),
            Arc::new(RealtimeFeed::new()),
            Arc::new(Lifecycle::new()),
        )
    }

    #[tokio::test]
    async fn test_reset_clears_state_and_requests_restart() {
        let (cache, feed, lifecycle) = fixture();
        feed.record(EntityKind::Farms, vec!["f1".to_string()]);
        let rx = lifecycle.subscribe();

        let action = LocalStateReset::new(cache.clone(), feed.clone(), lifecycle.clone());
        action.recover().await.unwrap();

        assert_eq!(cache.generation("workers"), Some(1));
        assert_eq!(cache.generation("farms"), Some(1));
        assert!(!feed.has_new_data());
        assert_eq!(wait_for_event(rx).await, LifecycleEvent::Restart);
    }

    #[tokio::test]
    async fn test_reset_without_main_loop_reports_error() {
        let (cache, feed, lifecycle) = fixture();
        let action = LocalStateReset::new(cache.clone(), feed, lifecycle);

        let err = action.recover().await.unwrap_err();
        assert!(err.to_string().contains("no task is listening"));
        // Local state is still wiped before the restart request.
        assert_eq!(cache.generation("rooms"), Some(1));
    }
}
