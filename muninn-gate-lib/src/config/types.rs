use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration for the gate
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to
    pub listen: SocketAddr,
    /// Rate limiting parameters
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Shutdown timing
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Metrics endpoint configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Rate limiting configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed per client within one window.
    ///
    /// A value of 0 still lets each client's very first request through:
    /// a client is only counted from the request that creates its counter.
    /// Default: 100
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,
    /// Window length in seconds
    /// Default: 60
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { max_requests: default_max_requests(), window_secs: default_window_secs() }
    }
}

fn default_max_requests() -> u64 {
    100
}

fn default_window_secs() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Include the event's module path in log lines
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), show_target: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Shutdown timing configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Seconds to wait for in-flight connections on shutdown
    /// Default: 30
    #[serde(default = "default_shutdown_secs")]
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { shutdown_secs: default_shutdown_secs() }
    }
}

fn default_shutdown_secs() -> u64 {
    30
}

/// Metrics endpoint configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Path the JSON metrics snapshot is served on
    /// Default: "/metrics"
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { metrics_path: default_metrics_path() }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
