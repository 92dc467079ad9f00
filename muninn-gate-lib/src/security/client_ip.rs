//! Client identity resolution.
//!
//! Derives the stable key the limiter tracks — a normalized client IP
//! address — from an inbound request, preferring a proxy-supplied
//! forwarding header over the transport peer address.

use std::net::{IpAddr, SocketAddr};

use http::HeaderMap;

use crate::error::{GateError, Result};

/// Resolve the client IP for a request.
///
/// `remote_addr` is the transport-level peer address as reported by the
/// accept loop (`"ip:port"`, IPv6 hosts in brackets). Proxy chains are
/// honored by scanning `X-Forwarded-For` left to right and taking the
/// first entry that parses as an IP address; entries that do not parse are
/// skipped. Falls back to `remote_addr`, and fails only when neither
/// source yields a valid address.
pub fn resolve_client_ip(headers: &HeaderMap, remote_addr: &str) -> Result<String> {
    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = xff.split(',').find_map(normalize_ip) {
            return Ok(ip);
        }
    }

    if let Ok(addr) = remote_addr.parse::<SocketAddr>() {
        return Ok(canonical(addr.ip()));
    }
    // The peer may be reported without a port.
    if let Some(ip) = normalize_ip(remote_addr) {
        return Ok(ip);
    }

    Err(GateError::ClientAddress(remote_addr.to_owned()))
}

/// Parse one candidate address, tolerating surrounding whitespace and IPv6
/// brackets, and return it in canonical form.
fn normalize_ip(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    trimmed.parse::<IpAddr>().ok().map(canonical)
}

/// IPv4-mapped IPv6 addresses collapse to their IPv4 form, so a client
/// seen over both stacks maps to a single key.
fn canonical(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => v6.to_canonical().to_string(),
    }
}
