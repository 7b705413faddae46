//! Reporting Module
//!
//! Composes cache and metrics state into stats views, a full report and a
//! health view. Holds no state of its own.

mod health;
mod views;

pub use health::{
    evaluate_health, health_view, CacheCheck, CheckStatus, CpuCheck, HealthChecks, HealthReport,
    HealthThresholds, MemoryCheck, UptimeCheck,
};
pub use views::{full_report, stats_view, FullReport, StatsCategory, StatsSummary, StatsView, SUMMARY_LIMIT};
