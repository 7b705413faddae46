//! Metrics Module
//!
//! In-process performance metrics: request, query and cache-operation timings
//! and periodic system resource samples.

mod records;
mod registry;
mod system;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use records::{CacheOpStats, QueryKind, QueryStats, RequestStats};
pub use registry::{MetricsRegistry, PerformanceReport, HISTORY_RETENTION};
pub use system::{process_resident_mb, SystemSampler, SystemSnapshot, SystemStats};
