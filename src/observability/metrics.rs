//! Metrics collection and exposition.
//!
//! # Metrics
//! - `authors_gate_requests_total` (counter): requests by route and status
//! - `authors_gate_rejections_total` (counter): pipeline rejections by reason
//! - `authors_gate_token_rotations_total` (counter): completed token rotations
//! - `authors_gate_tracked_clients` (gauge): clients held by each rate limiter, by scope
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so
//! tests and library users pay nothing for it.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(route: &'static str, status: u16) {
    counter!(
        "authors_gate_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a request rejected by a pipeline stage.
pub fn record_rejection(reason: &'static str) {
    counter!("authors_gate_rejections_total", "reason" => reason).increment(1);
}

/// Record a successful token rotation.
pub fn record_token_rotation() {
    counter!("authors_gate_token_rotations_total").increment(1);
}

/// Record the number of clients tracked by the rate limiter for `scope`.
pub fn record_tracked_clients(scope: &'static str, count: usize) {
    gauge!("authors_gate_tracked_clients", "scope" => scope).set(count as f64);
}
