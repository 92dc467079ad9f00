#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod security;
pub mod telemetry;

pub use config::{load_from_path, Config, LoggingConfig, RateLimitConfig};
pub use error::{GateError, Result};
pub use gate::server::{run, serve_with_listener};
pub use gate::Gate;
pub use security::client_ip::resolve_client_ip;
pub use security::rate_limit::{MetricsSnapshot, ShardedLimiter, SHARD_COUNT};
