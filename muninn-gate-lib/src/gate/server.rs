//! HTTP wiring for the admission gate: accept loop, per-connection
//! service, metrics endpoint, graceful shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::header::CONTENT_TYPE;
use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::gate::{body_from, Gate, RespBody};

/// Guard to decrement the active connection counter when dropped
struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Bind the configured listen address and serve until SIGINT/SIGTERM.
pub async fn run(config: Arc<Config>) -> Result<()> {
    let listener = TcpListener::bind(config.listen).await?;
    serve_with_listener(listener, config).await
}

/// Serve on an already-bound listener.
///
/// Split out of [`run`] so embedders and tests can bind an ephemeral port
/// and read its address before serving starts.
pub async fn serve_with_listener(listener: TcpListener, config: Arc<Config>) -> Result<()> {
    let builder = ConnBuilder::new(TokioExecutor::new());
    let gate = Gate::from_config(&config.rate_limit);
    let metrics_path = Arc::new(config.telemetry.metrics_path.clone());

    let active_connections = Arc::new(AtomicUsize::new(0));

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

    let addr = listener.local_addr()?;
    info!(
        ?addr,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        "starting admission gate"
    );

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, initiating graceful shutdown");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, initiating graceful shutdown");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                active_connections.fetch_add(1, Ordering::Relaxed);

                let builder = builder.clone();
                let gate = gate.clone();
                let metrics_path = Arc::clone(&metrics_path);
                let active_connections = Arc::clone(&active_connections);

                tokio::spawn(async move {
                    // Ensure the counter is decremented when the connection finishes
                    let _guard = ConnectionGuard(active_connections);
                    let remote_addr = peer.to_string();

                    let svc = service_fn(move |req: Request<Incoming>| {
                        let gate = gate.clone();
                        let remote_addr = remote_addr.clone();
                        let metrics_path = Arc::clone(&metrics_path);

                        async move {
                            if req.uri().path() == metrics_path.as_str() {
                                return Ok::<_, hyper::Error>(metrics_response(&gate));
                            }

                            if let Some(rejection) = gate.check(&remote_addr, req.headers()) {
                                return Ok(rejection);
                            }

                            Ok(origin(req))
                        }
                    });

                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }

    info!(
        "waiting for active connections to finish (timeout: {}s)",
        config.timeout.shutdown_secs
    );
    let shutdown_timeout = Duration::from_secs(config.timeout.shutdown_secs);
    let start = std::time::Instant::now();

    loop {
        let active = active_connections.load(Ordering::Relaxed);
        if active == 0 {
            info!("all connections closed, shutdown complete");
            break;
        }

        if start.elapsed() >= shutdown_timeout {
            warn!(active_connections = active, "shutdown timeout reached");
            break;
        }

        sleep(Duration::from_millis(100)).await;
    }

    info!("admission gate stopped");
    Ok(())
}

/// Stand-in origin handler: the action admitted requests proceed to.
fn origin(_req: Request<Incoming>) -> Response<RespBody> {
    let mut resp = Response::new(body_from(bytes::Bytes::from_static(b"OK\n")));
    resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    resp
}

fn metrics_response(gate: &Gate) -> Response<RespBody> {
    match serde_json::to_vec(&gate.snapshot()) {
        Ok(body) => {
            let mut resp = Response::new(body_from(bytes::Bytes::from(body)));
            resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize metrics snapshot");
            let mut resp = Response::new(body_from(bytes::Bytes::new()));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        }
    }
}
