//! API Routes
//!
//! Configures the Axum router with the cache, stats and health endpoints.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_delete_handler, cache_expire_handler, cache_flush_handler, cache_get_handler,
    cache_set_handler, clear_stats_handler, health_handler, history_handler, report_handler,
    stats_handler, AppState,
};
use super::middleware::track_requests;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a JSON value
/// - `DELETE /cache` - Flush the active backing store
/// - `GET /cache/:key` - Retrieve a value by key
/// - `DELETE /cache/:key` - Delete a key
/// - `POST /cache/:key/expire` - Reset a key's TTL
/// - `GET /stats` - Stats by category, or a summary
/// - `DELETE /stats` - Clear accumulated metrics
/// - `GET /stats/history` - System sample time series
/// - `GET /report` - Full performance report
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Request timing: feeds every request into the metrics registry
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(cache_set_handler).delete(cache_flush_handler))
        .route(
            "/cache/:key",
            get(cache_get_handler).delete(cache_delete_handler),
        )
        .route("/cache/:key/expire", post(cache_expire_handler))
        .route("/stats", get(stats_handler).delete(clear_stats_handler))
        .route("/stats/history", get(history_handler))
        .route("/report", get(report_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::metrics::MetricsRegistry;
    use crate::reporting::HealthThresholds;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let cache = Arc::new(CacheStore::new(300));
        let thresholds = HealthThresholds {
            memory_mb: 1_000_000.0,
        };
        let state = AppState::new(cache, metrics.clone(), thresholds);
        (create_router(state), metrics)
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/cache")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"test","value":{"a":1}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_requests_recorded_by_route_template() {
        let (app, metrics) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/some_key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let stats = metrics.get_request_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].endpoint, "GET:/cache/:key");
        assert_eq!(stats[0].status_codes.get(&404), Some(&1));
    }
}
