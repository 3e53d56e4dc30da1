use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Wraps every request in a span carrying a fresh request id, then logs
/// method, route, status and latency on the way out.
pub async fn request_tracing_middleware(
    matched_path: MatchedPath,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let route = matched_path.as_str().to_owned();
    let start = Instant::now();

    let span = info_span!(
        "http_request",
        method = %method,
        route = %route,
        request_id = %uuid::Uuid::now_v7(),
    );

    let response = next.run(request).instrument(span).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    info!(
        method = %method,
        route = %route,
        status,
        latency_ms,
        "request completed"
    );

    response
}
