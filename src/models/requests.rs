//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Request body for `PUT /cache`
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value
/// - `ttl`: Optional TTL in seconds (uses default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

/// Request body for `POST /cache/:key/expire`
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    /// New TTL in seconds
    pub ttl: u64,
}

/// Query string for `GET /stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    /// One of requests, database, cache, system; summary when absent
    #[serde(default)]
    pub category: Option<String>,
}
