//! Metrics collection and exposition.
//!
//! # Metrics
//! - `grafana_proxy_requests_total` (counter): proxied requests by method, status
//! - `grafana_proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `grafana_proxy_upstream_errors_total` (counter): transport failures by kind
//!
//! Recording is a no-op until a recorder is installed, so tests need no setup.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start_time: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!(
        "grafana_proxy_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    metrics::histogram!(
        "grafana_proxy_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start_time.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    metrics::counter!("grafana_proxy_upstream_errors_total", "kind" => kind).increment(1);
}
