use std::time::{Duration, Instant};

use axum::{middleware::Next, response::Response};

/// Log every request with its outcome and latency.
pub async fn log_requests(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = whole_millis(started.elapsed());
    if response.status().is_server_error() {
        tracing::error!(%method, path = %path, status, latency_ms, "request failed");
    } else {
        tracing::info!(%method, path = %path, status, latency_ms, "request completed");
    }

    response
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
