//! API Handlers
//!
//! HTTP request handlers for the cache, stats and health endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{MetricsRegistry, SystemSnapshot};
use crate::models::{
    ApiResponse, ClearStatsResponse, DeleteResponse, ExpireRequest, ExpireResponse,
    FlushResponse, GetResponse, SetRequest, SetResponse, StatsQuery,
};
use crate::reporting::{
    full_report, health_view, stats_view, FullReport, HealthThresholds, StatsCategory, StatsView,
};

/// Application state shared across all handlers.
///
/// One cache store and one metrics registry per process, shared by `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
    pub metrics: Arc<MetricsRegistry>,
    pub thresholds: HealthThresholds,
}

impl AppState {
    /// Creates a new AppState from already built components.
    pub fn new(
        cache: Arc<CacheStore>,
        metrics: Arc<MetricsRegistry>,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            cache,
            metrics,
            thresholds,
        }
    }

    /// Builds the registry and an instrumented cache store, then initializes the cache.
    pub async fn from_config(config: &Config) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let cache = CacheStore::from_config(config).with_metrics(metrics.clone());
        cache.initialize().await;

        Self::new(
            Arc::new(cache),
            metrics,
            HealthThresholds::from_config(config),
        )
    }
}

// == Cache Handlers ==

/// Handler for PUT /cache
pub async fn cache_set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> ApiResult<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    if !state.cache.set(&req.key, &req.value, req.ttl).await {
        return Err(ApiError::Internal(format!("Failed to store key '{}'", req.key)));
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
pub async fn cache_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    match state.cache.get::<Value>(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn cache_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache.del(&key).await;
    Json(DeleteResponse { key, deleted })
}

/// Handler for POST /cache/:key/expire
pub async fn cache_expire_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ExpireRequest>,
) -> Json<ExpireResponse> {
    let updated = state.cache.expire(&key, req.ttl).await;
    Json(ExpireResponse { key, updated })
}

/// Handler for DELETE /cache
pub async fn cache_flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    let flushed = state.cache.flush().await;
    Json(FlushResponse { flushed })
}

// == Stats Handlers ==

/// Handler for GET /stats
///
/// Category-selected stats, or a capped summary without `?category=`.
pub async fn stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<ApiResponse<StatsView>>> {
    let category = query
        .category
        .as_deref()
        .map(str::parse::<StatsCategory>)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;

    let view = stats_view(&state.metrics, category).map_err(|e| {
        error!("Failed to build stats view: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(ApiResponse::ok(view)))
}

/// Handler for GET /report
pub async fn report_handler(State(state): State<AppState>) -> Json<ApiResponse<FullReport>> {
    let report = full_report(&state.metrics, &state.cache).await;
    Json(ApiResponse::ok(report))
}

/// Handler for GET /stats/history
pub async fn history_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<SystemSnapshot>>> {
    Json(ApiResponse::ok(state.metrics.system_history()))
}

/// Handler for DELETE /stats
///
/// Wipes all accumulated request, query and cache metrics.
pub async fn clear_stats_handler(
    State(state): State<AppState>,
) -> Json<ApiResponse<ClearStatsResponse>> {
    let removed = state.metrics.cleanup(Duration::ZERO);
    Json(ApiResponse::ok(ClearStatsResponse { removed }))
}

// == Health Handler ==

/// Handler for GET /health
///
/// 200 when every check passes, 206 when any warns, 503 if the checks
/// could not be computed.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match health_view(&state.metrics, &state.cache, state.thresholds).await {
        Ok(report) => (report.status_code(), Json(report)).into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            let body = json!({
                "status": "error",
                "error": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_state() -> AppState {
        let metrics = Arc::new(MetricsRegistry::new());
        let cache = Arc::new(CacheStore::new(300).with_metrics(metrics.clone()));
        AppState::new(cache, metrics, HealthThresholds::default())
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: json!({"a": 1}),
            ttl: None,
        };
        let result = cache_set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let result = cache_get_handler(State(state.clone()), Path("test_key".to_string())).await;
        let response = result.unwrap();
        assert_eq!(response.value, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = cache_get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.cache.set("to_delete", "value", None).await;

        let response = cache_delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(response.deleted);

        let response = cache_delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(!response.deleted);
    }

    #[tokio::test]
    async fn test_expire_and_flush_handlers() {
        let state = test_state();
        state.cache.set("k", "v", Some(5)).await;

        let response = cache_expire_handler(
            State(state.clone()),
            Path("k".to_string()),
            Json(ExpireRequest { ttl: 60 }),
        )
        .await;
        assert!(response.updated);

        let response = cache_flush_handler(State(state.clone())).await;
        assert!(response.flushed);
        assert!(state.cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state();

        let req = SetRequest {
            key: "".to_string(),
            value: json!("value"),
            ttl: None,
        };
        let result = cache_set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler_unknown_category() {
        let state = test_state();
        let query = StatsQuery {
            category: Some("disk".to_string()),
        };

        let result = stats_handler(State(state), Query(query)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_stats_handler() {
        let state = test_state();
        state.metrics.record_request("GET", "/", 1.0, 200);
        state.metrics.record_database_query("SELECT 1", 1.0, 1);

        let response = clear_stats_handler(State(state.clone())).await;
        assert_eq!(response.data.removed, 2);
        assert!(state.metrics.get_request_stats().is_empty());
    }
}
