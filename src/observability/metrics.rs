//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_tracker_pipelines_total` (counter): finished pipelines by outcome
//! - `ledger_tracker_events_total` (counter): tracking events by kind
//! - `ledger_tracker_gateway_calls_total` (counter): gateway calls by operation, result
//! - `ledger_tracker_gateway_call_duration_seconds` (histogram): gateway latency by operation
//! - `ledger_tracker_status_lookups_total` (counter): status lookups by result

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_pipeline_outcome(outcome: &'static str) {
    metrics::counter!("ledger_tracker_pipelines_total", "outcome" => outcome).increment(1);
}

pub fn record_event(kind: &'static str) {
    metrics::counter!("ledger_tracker_events_total", "kind" => kind).increment(1);
}

pub fn record_gateway_call(operation: &'static str, result: &'static str, started: Instant) {
    metrics::counter!(
        "ledger_tracker_gateway_calls_total",
        "operation" => operation,
        "result" => result
    )
    .increment(1);
    metrics::histogram!(
        "ledger_tracker_gateway_call_duration_seconds",
        "operation" => operation
    )
    .record(started.elapsed().as_secs_f64());
}

pub fn record_status_lookup(result: &'static str) {
    metrics::counter!("ledger_tracker_status_lookups_total", "result" => result).increment(1);
}
