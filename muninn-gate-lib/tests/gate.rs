use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderValue, StatusCode};
use muninn_gate_lib::config::{
    Config, LoggingConfig, RateLimitConfig, TelemetryConfig, TimeoutConfig,
};
use muninn_gate_lib::{serve_with_listener, Gate};
use tokio::net::TcpListener;

fn test_config(max_requests: u64, window_secs: u64) -> Config {
    Config {
        listen: "127.0.0.1:0".parse().expect("valid listen address"),
        rate_limit: RateLimitConfig { max_requests, window_secs },
        logging: LoggingConfig::default(),
        timeout: TimeoutConfig::default(),
        telemetry: TelemetryConfig::default(),
    }
}

async fn start_server(config: Config) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let _ = serve_with_listener(listener, Arc::new(config)).await;
    });
    (addr, server)
}

#[tokio::test]
async fn test_unresolvable_peer_is_rejected_as_forbidden() {
    let gate = Gate::new(5, Duration::from_secs(60));

    let rejection = gate.check("not-an-address", &HeaderMap::new()).expect("rejection");
    assert_eq!(rejection.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_gate_allows_then_limits() {
    let gate = Gate::new(1, Duration::from_secs(60));

    assert!(gate.check("192.0.2.1:4711", &HeaderMap::new()).is_none());
    let rejection = gate.check("192.0.2.1:4711", &HeaderMap::new()).expect("rejection");
    assert_eq!(rejection.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        rejection.headers().get("x-rate-limit-limit"),
        Some(&HeaderValue::from_static("1"))
    );
}

#[tokio::test]
async fn test_forwarded_header_resolves_before_peer() {
    let gate = Gate::new(1, Duration::from_secs(60));

    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.195"));

    assert!(gate.check("10.0.0.1:9999", &headers).is_none());

    // The forwarded client, not the peer, consumed the budget.
    let rejection = gate.check("10.0.0.1:9999", &headers).expect("rejection");
    assert_eq!(rejection.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(gate.check("10.0.0.1:9999", &HeaderMap::new()).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_returns_429_beyond_the_limit() {
    let (addr, server) = start_server(test_config(2, 60)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/");

    assert_eq!(client.get(&url).send().await.expect("request").status().as_u16(), 200);
    assert_eq!(client.get(&url).send().await.expect("request").status().as_u16(), 200);

    let resp = client.get(&url).send().await.expect("request");
    assert_eq!(resp.status().as_u16(), 429);
    assert_eq!(
        resp.headers().get("x-rate-limit-limit").and_then(|v| v.to_str().ok()),
        Some("2")
    );
    assert_eq!(resp.text().await.expect("body"), "Rate limit exceeded");

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_keys_on_forwarded_client() {
    let (addr, server) = start_server(test_config(1, 60)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/");

    for forwarded in ["203.0.113.7", "203.0.113.8"] {
        let resp = client
            .get(&url)
            .header("x-forwarded-for", forwarded)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status().as_u16(), 200);
    }

    let resp = client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.7")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status().as_u16(), 429);

    server.abort();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_metrics_endpoint_reports_counters() {
    let (addr, server) = start_server(test_config(1, 60)).await;
    let client = reqwest::Client::new();
    let url = format!("http://{addr}/");

    assert_eq!(client.get(&url).send().await.expect("request").status().as_u16(), 200);
    assert_eq!(client.get(&url).send().await.expect("request").status().as_u16(), 429);

    let resp = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .expect("metrics request");
    assert_eq!(resp.status().as_u16(), 200);

    let snapshot: serde_json::Value = resp.json().await.expect("metrics json");
    assert_eq!(snapshot["total_requests"], 2);
    assert_eq!(snapshot["blocked_requests"], 1);
    assert_eq!(snapshot["active_clients"], 1);
    assert_eq!(snapshot["cleanup_interval_ms"], 120_000);

    server.abort();
}
