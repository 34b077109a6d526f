//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! No literal timeout or size defaults are part of the core's contract;
//! the defaults here belong to the demo server.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Per-phase exchange timeouts.
    pub timeouts: ExchangeTimeouts,

    /// Per-exchange size and reuse limits.
    pub limits: ExchangeLimits,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Per-phase timeouts. Each guards exactly one phase of the exchange;
/// a single deadline spans all reads within that phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeTimeouts {
    /// Header-read timeout in milliseconds.
    pub header_read_ms: u64,

    /// Body-read timeout in milliseconds.
    pub body_read_ms: u64,

    /// Response-write timeout in milliseconds.
    pub write_ms: u64,
}

impl ExchangeTimeouts {
    pub fn header_read(&self) -> Duration {
        Duration::from_millis(self.header_read_ms)
    }

    pub fn body_read(&self) -> Duration {
        Duration::from_millis(self.body_read_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }
}

impl Default for ExchangeTimeouts {
    fn default() -> Self {
        Self {
            header_read_ms: 10_000,
            body_read_ms: 30_000,
            write_ms: 30_000,
        }
    }
}

/// Size and reuse limits for a single connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeLimits {
    /// Maximum buffered request-head bytes before the connection is
    /// rejected as too large.
    pub max_head_bytes: usize,

    /// Maximum buffered request-body bytes.
    pub max_body_bytes: usize,

    /// Keep-alive reuse cap: requests served on one connection before it
    /// is closed regardless of what dispatch asked for.
    pub max_requests_per_connection: u64,
}

impl Default for ExchangeLimits {
    fn default() -> Self {
        Self {
            max_head_bytes: 16 * 1024,
            max_body_bytes: 2 * 1024 * 1024,
            max_requests_per_connection: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
