//! Error types for the cache and metrics service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Reason a cache operation fell back to its neutral default.
///
/// Never escapes the `CacheStore` boundary through `get`/`set`; only the
/// `try_*` variants hand it to callers.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Remote backing store rejected a command
    #[error("Remote cache error: {0}")]
    Remote(String),

    /// Remote backing store is unreachable or dropped the connection
    #[error("Remote cache disconnected: {0}")]
    Disconnected(String),

    /// Value could not be serialized or a stored value could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No backing store could serve the request
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// True when the error means the remote store can no longer be reached.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CacheError::Disconnected(_))
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
            || err.is_timeout()
        {
            CacheError::Disconnected(err.to_string())
        } else {
            CacheError::Remote(err.to_string())
        }
    }
}

// == Metrics Error Enum ==
/// Failures while sampling process or OS resources.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// The current process could not be located by the system sampler
    #[error("Process not found: {0}")]
    ProcessNotFound(String),
}

// == API Error Enum ==
/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<MetricsError> for ApiError {
    fn from(err: MetricsError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Aliases ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Convenience Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
