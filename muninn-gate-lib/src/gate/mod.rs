//! The admission gate: identity resolution and rate limiting in front of
//! a request handler.

pub mod server;

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, Response, StatusCode};
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::security::client_ip::resolve_client_ip;
use crate::security::rate_limit::{MetricsSnapshot, ShardedLimiter};

pub type RespBody = BoxBody<bytes::Bytes, hyper::Error>;

/// Admission filter for inbound requests.
///
/// One gate guards one handler chain. Cloning is cheap and shares the
/// underlying limiter, so per-connection tasks can each hold a copy.
#[derive(Clone)]
pub struct Gate {
    limiter: Arc<ShardedLimiter>,
}

impl Gate {
    /// Build a gate admitting `max_requests` per client per `window`.
    ///
    /// Must be called from within a Tokio runtime: the limiter starts its
    /// reclamation task at construction.
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self { limiter: ShardedLimiter::new(max_requests, window) }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window())
    }

    /// Check one request against the gate.
    ///
    /// Returns:
    /// - `None` if the request may proceed to the wrapped handler
    /// - `Some(403 response)` if no valid client address can be resolved
    /// - `Some(429 response)` if the client exceeded its rate
    pub fn check(&self, remote_addr: &str, headers: &HeaderMap) -> Option<Response<RespBody>> {
        let client_ip = match resolve_client_ip(headers, remote_addr) {
            Ok(ip) => ip,
            Err(err) => {
                debug!(%remote_addr, error = %err, "rejecting request without a valid client address");
                return Some(forbidden());
            }
        };

        if self.limiter.admit(&client_ip) {
            None
        } else {
            debug!(client = %client_ip, "rate limit exceeded");
            Some(too_many_requests(self.limiter.max_requests()))
        }
    }

    /// Current counters, for the metrics endpoint.
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.limiter.snapshot()
    }
}

pub(crate) fn body_from(bytes: bytes::Bytes) -> RespBody {
    Full::new(bytes).map_err(|never| match never {}).boxed()
}

fn forbidden() -> Response<RespBody> {
    let mut resp = Response::new(body_from(bytes::Bytes::from_static(b"Forbidden - Invalid IP")));
    *resp.status_mut() = StatusCode::FORBIDDEN;
    resp
}

fn too_many_requests(limit: u64) -> Response<RespBody> {
    let mut resp = Response::new(body_from(bytes::Bytes::from_static(b"Rate limit exceeded")));
    *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;

    resp.headers_mut().insert(
        HeaderName::from_static("x-rate-limit-limit"),
        HeaderValue::from_str(&limit.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    resp
}
