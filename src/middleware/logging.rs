//! Logging middleware
//!
//! Logs every HTTP request with its status and latency.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use log::{info, warn};

/// Log a request once its response is ready
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    if status.is_server_error() {
        warn!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    } else {
        info!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    }

    response
}
