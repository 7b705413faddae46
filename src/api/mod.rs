//! API Module
//!
//! HTTP handlers, request timing middleware and routing.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache` - Store a value / flush
//! - `GET /cache/:key`, `DELETE /cache/:key` - Read / delete a key
//! - `POST /cache/:key/expire` - Reset a key's TTL
//! - `GET /stats`, `DELETE /stats` - Stats views / clear metrics
//! - `GET /stats/history` - System sample time series
//! - `GET /report` - Full performance report
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
