//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define client metrics (calls, attempts, failovers, quarantine size)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dfapi_requests_total` (counter): logical calls by method, outcome
//! - `dfapi_request_duration_seconds` (histogram): logical call latency
//! - `dfapi_attempts_total` (counter): network attempts by endpoint
//! - `dfapi_failovers_total` (counter): failover retries by from/to endpoint
//! - `dfapi_quarantined_endpoints` (gauge): endpoints currently quarantined
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the end of one logical call.
pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    counter!("dfapi_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("dfapi_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record one network attempt against an endpoint.
pub fn record_attempt(endpoint: &str) {
    counter!("dfapi_attempts_total", "endpoint" => endpoint.to_string()).increment(1);
}

/// Record a failover retry from one endpoint to another.
pub fn record_failover(from: &str, to: &str) {
    counter!(
        "dfapi_failovers_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

pub fn record_quarantined(count: usize) {
    gauge!("dfapi_quarantined_endpoints").set(count as f64);
}
