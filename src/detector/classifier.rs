//! Backend relevance classification.
//!
//! # Responsibilities
//! - Decide whether a request URL targets the remote data backend
//! - Decide whether a log line describes backend connectivity trouble
//!
//! # Design Decisions
//! - Plain substring matching, case-insensitive, no regex
//! - A log pattern matches only when all of its terms are present
//! - Empty patterns and terms are discarded so they can never match everything

use crate::config::DetectorConfig;

/// Compiled (lowercased) matching rules.
#[derive(Debug, Clone, Default)]
pub struct BackendMatcher {
    hosts: Vec<String>,
    log_patterns: Vec<Vec<String>>,
}

impl BackendMatcher {
    pub fn new(config: &DetectorConfig) -> Self {
        let hosts = config
            .backend_patterns
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        let log_patterns = config
            .log_patterns
            .iter()
            .map(|p| {
                p.all_of
                    .iter()
                    .map(|t| t.trim().to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|terms| !terms.is_empty())
            .collect();

        Self { hosts, log_patterns }
    }

    /// Returns true if the URL belongs to the backend.
    pub fn matches_target(&self, target: &str) -> bool {
        let target = target.to_lowercase();
        self.hosts.iter().any(|h| target.contains(h.as_str()))
    }

    /// Returns true if the log line matches any connectivity pattern.
    pub fn matches_log(&self, line: &str) -> bool {
        let line = line.to_lowercase();
        self.log_patterns
            .iter()
            .any(|terms| terms.iter().all(|t| line.contains(t.as_str())))
    }
}
