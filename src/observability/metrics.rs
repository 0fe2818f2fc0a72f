//! Metrics collection and exposition.
//!
//! # Metrics
//! - `monitor_samples_total` (counter): observed outcomes by outcome, relevant
//! - `monitor_failures_counted_total` (counter): failures counted by path
//! - `monitor_samples_debounced_total` (counter): failures dropped by debounce
//! - `monitor_alert_visible` (gauge): 1=alerting, 0=quiet
//! - `monitor_error_count` (gauge): current consecutive failure count
//! - `monitor_recoveries_total` (counter): recovery requests by result
//! - `monitor_forwarded_requests_total` (counter): forwarded requests by status
//! - `monitor_forward_duration_seconds` (histogram): upstream latency
//!
//! # Design Decisions
//! - Facade calls are no-ops until a recorder is installed
//! - Low-cardinality labels only (no URLs)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::warn!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_sample(outcome: &'static str, relevant: bool) {
    let relevant = if relevant { "true" } else { "false" };
    counter!("monitor_samples_total", "outcome" => outcome, "relevant" => relevant).increment(1);
}

pub fn record_failure_counted(path: &'static str) {
    counter!("monitor_failures_counted_total", "path" => path).increment(1);
}

pub fn record_debounced() {
    counter!("monitor_samples_debounced_total").increment(1);
}

pub fn record_alert(visible: bool, error_count: u32) {
    gauge!("monitor_alert_visible").set(if visible { 1.0 } else { 0.0 });
    gauge!("monitor_error_count").set(error_count as f64);
}

pub fn record_recovery(result: &'static str) {
    counter!("monitor_recoveries_total", "result" => result).increment(1);
}

pub fn record_forwarded(status: u16, start: Instant) {
    counter!("monitor_forwarded_requests_total", "status" => status.to_string()).increment(1);
    histogram!("monitor_forward_duration_seconds").record(start.elapsed().as_secs_f64());
}
