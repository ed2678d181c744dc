//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ingress_requests_total` (counter): requests by method and status,
//!   including ones rejected before reaching the upstream
//! - `ingress_request_duration_seconds` (histogram): time to response headers
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "ingress_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("ingress_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}
