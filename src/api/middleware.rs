//! Request Timing Middleware
//!
//! Records method, route, duration and status of every request in the
//! metrics registry.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use super::handlers::AppState;

/// Times the request and records it under its route template.
///
/// Unmatched requests are recorded under their raw path.
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    state
        .metrics
        .record_request(&method, &path, elapsed_ms, response.status().as_u16());

    response
}
