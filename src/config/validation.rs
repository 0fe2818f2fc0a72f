//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds > 0, addresses parse)
//! - Check that the upstream timeout fits inside the request timeout
//! - Detect duplicate collection names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid upstream base_url (expected http://host): {0}")]
    InvalidUpstream(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("detector.backend_patterns must not be empty")]
    NoBackendPatterns,

    #[error("detector.log_patterns[{0}] has no terms")]
    EmptyLogPattern(usize),

    #[error("duplicate cache collection: {0}")]
    DuplicateCollection(String),

    #[error(
        "upstream.timeout_secs ({upstream_secs}) must be less than \
         listener.request_timeout_secs ({request_secs})"
    )]
    UpstreamTimeoutTooLong { upstream_secs: u64, request_secs: u64 },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.admin.enabled {
        check_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match Url::parse(&config.upstream.base_url) {
        // The forwarding client speaks plain HTTP only.
        Ok(url) if url.has_host() && url.scheme() == "http" => {}
        _ => errors.push(ValidationError::InvalidUpstream(
            config.upstream.base_url.clone(),
        )),
    }

    let detector = &config.detector;
    if detector.backend_patterns.iter().all(|p| p.trim().is_empty()) {
        errors.push(ValidationError::NoBackendPatterns);
    }
    for (i, pattern) in detector.log_patterns.iter().enumerate() {
        if pattern.all_of.iter().all(|t| t.trim().is_empty()) {
            errors.push(ValidationError::EmptyLogPattern(i));
        }
    }
    let positive = [
        ("detector.failure_threshold", detector.failure_threshold as u64),
        ("detector.log_failure_threshold", detector.log_failure_threshold as u64),
        ("detector.success_threshold", detector.success_threshold as u64),
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("listener.request_timeout_secs", config.listener.request_timeout_secs),
        ("recovery.ticket_ttl_secs", config.recovery.ticket_ttl_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }

    // The observed upstream call must time out before the outer request
    // timeout drops it.
    let upstream_secs = config.upstream.timeout_secs;
    let request_secs = config.listener.request_timeout_secs;
    if upstream_secs > 0 && request_secs > 0 && upstream_secs >= request_secs {
        errors.push(ValidationError::UpstreamTimeoutTooLong {
            upstream_secs,
            request_secs,
        });
    }

    let mut seen = HashSet::new();
    for collection in &config.cache.collections {
        if !seen.insert(collection.name.as_str()) {
            errors.push(ValidationError::DuplicateCollection(collection.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
