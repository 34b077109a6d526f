//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_connections_accepted_total` (counter)
//! - `server_connections_closed_total` (counter)
//! - `server_requests_served_total` (counter)
//! - `server_phase_timeouts_total` (counter, by phase)
//! - `server_connection_errors_total` (counter)
//! - `server_active_connections` (gauge)

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::connection::Phase;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_connection_accepted() {
    metrics::counter!("server_connections_accepted_total").increment(1);
    metrics::gauge!("server_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::counter!("server_connections_closed_total").increment(1);
    metrics::gauge!("server_active_connections").decrement(1.0);
}

pub fn record_request_served() {
    metrics::counter!("server_requests_served_total").increment(1);
}

pub fn record_timeout(phase: Phase) {
    metrics::counter!("server_phase_timeouts_total", "phase" => phase.to_string()).increment(1);
}

pub fn record_connection_error() {
    metrics::counter!("server_connection_errors_total").increment(1);
}
