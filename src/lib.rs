//! perfcache - dual-mode cache and performance metrics service
//!
//! A key/value cache that uses Redis when reachable and an in-process expiry
//! map otherwise, plus request, query, cache and system metrics with health
//! reporting.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod reporting;
pub mod tasks;
pub mod time;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use metrics::MetricsRegistry;
pub use tasks::BackgroundTasks;
