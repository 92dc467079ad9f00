pub mod client_ip;
pub mod rate_limit;

pub use client_ip::resolve_client_ip;
