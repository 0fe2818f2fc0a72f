//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the connectivity monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Listener for forwarded application traffic.
    pub listener: ListenerConfig,

    /// Remote data backend that traffic is forwarded to.
    pub upstream: UpstreamConfig,

    /// Failure detection heuristics.
    pub detector: DetectorConfig,

    /// Cache collections shown on the dashboard.
    pub cache: CacheConfig,

    /// Recovery confirmation settings.
    pub recovery: RecoveryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout for the whole forwarded exchange, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Upstream backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL requests are forwarded to (scheme + authority).
    pub base_url: String,

    /// Per-call timeout for the upstream client in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 10,
        }
    }
}

/// A log line matches when every term appears in it (case-insensitive).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LogPattern {
    pub all_of: Vec<String>,
}

impl LogPattern {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all_of: terms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Failure detector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Substrings identifying the remote data backend in request URLs.
    pub backend_patterns: Vec<String>,

    /// Log line patterns that indicate backend connectivity trouble.
    pub log_patterns: Vec<LogPattern>,

    /// Minimum separation between two counted transport failures.
    pub debounce_ms: u64,

    /// Counted transport failures that raise the alert.
    pub failure_threshold: u32,

    /// Failure count that raises the alert on the logged-error path.
    pub log_failure_threshold: u32,

    /// Consecutive backend successes that clear the alert.
    pub success_threshold: u32,

    /// Apply the debounce interval to logged errors as well.
    pub debounce_logged_errors: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend_patterns: vec![
                "firestore.googleapis.com".to_string(),
                "firebase".to_string(),
                "googleapis.com".to_string(),
            ],
            log_patterns: vec![
                LogPattern::new(["failed to fetch", "firebase"]),
                LogPattern::new(["permission-denied", "firestore"]),
                LogPattern::new(["network", "firebase"]),
            ],
            debounce_ms: 1000,
            failure_threshold: 3,
            log_failure_threshold: 2,
            success_threshold: 2,
            debounce_logged_errors: false,
        }
    }
}

/// Where a collection's cached data lives.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheStorage {
    Session,
    Local,
    None,
}

/// One cached collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectionConfig {
    /// Collection name (e.g. "workers").
    pub name: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_storage")]
    pub storage: CacheStorage,

    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: u32,
}

fn default_enabled() -> bool {
    true
}

fn default_storage() -> CacheStorage {
    CacheStorage::Session
}

fn default_expiry_minutes() -> u32 {
    30
}

/// Cache collections and realtime feeds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub collections: Vec<CollectionConfig>,

    /// Collections fed by realtime listeners instead of the cache.
    pub realtime: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collections: vec![
                CollectionConfig {
                    name: "workers".to_string(),
                    enabled: true,
                    storage: CacheStorage::Session,
                    expiry_minutes: 30,
                },
                CollectionConfig {
                    name: "farms".to_string(),
                    enabled: true,
                    storage: CacheStorage::Local,
                    expiry_minutes: 60,
                },
                CollectionConfig {
                    name: "rooms".to_string(),
                    enabled: true,
                    storage: CacheStorage::Session,
                    expiry_minutes: 45,
                },
            ],
            realtime: vec!["notifications".to_string()],
        }
    }
}

/// Recovery confirmation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Lifetime of a confirmation ticket issued by the admin API.
    pub ticket_ttl_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self { ticket_ttl_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "https://firestore.googleapis.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "https://firestore.googleapis.com");
        assert_eq!(config.detector.failure_threshold, 3);
        assert_eq!(config.detector.log_failure_threshold, 2);
        assert_eq!(config.detector.success_threshold, 2);
        assert_eq!(config.detector.debounce_ms, 1000);
        assert_eq!(config.cache.collections.len(), 3);
    }

    #[test]
    fn test_collection_defaults_and_storage() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [[cache.collections]]
            name = "farms"
            storage = "local"

            [[cache.collections]]
            name = "rooms"
            enabled = false
            storage = "none"
            "#,
        )
        .unwrap();

        let farms = &config.cache.collections[0];
        assert!(farms.enabled);
        assert_eq!(farms.storage, CacheStorage::Local);
        assert_eq!(farms.expiry_minutes, 30);

        let rooms = &config.cache.collections[1];
        assert!(!rooms.enabled);
        assert_eq!(rooms.storage, CacheStorage::None);
    }

    #[test]
    fn test_log_patterns_parse() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [detector]
            backend_patterns = ["api.example.com"]

            [[detector.log_patterns]]
            all_of = ["timeout", "example"]
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.backend_patterns, vec!["api.example.com"]);
        assert_eq!(
            config.detector.log_patterns,
            vec![LogPattern::new(["timeout", "example"])]
        );
    }
}
