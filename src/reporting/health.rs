//! Health View
//!
//! Threshold checks over a system sample and the cache store's state.

use axum::http::StatusCode;
use serde::Serialize;

use crate::cache::{CacheStore, CacheStoreStats};
use crate::config::Config;
use crate::error::MetricsError;
use crate::metrics::{MetricsRegistry, SystemStats};

// == Check Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Warning,
}

impl CheckStatus {
    fn from_ok(ok: bool) -> Self {
        if ok {
            CheckStatus::Healthy
        } else {
            CheckStatus::Warning
        }
    }
}

// == Thresholds ==
/// Limits the health checks compare against.
#[derive(Debug, Clone, Copy)]
pub struct HealthThresholds {
    /// Resident memory ceiling in MB
    pub memory_mb: f64,
}

impl HealthThresholds {
    pub fn from_config(config: &Config) -> Self {
        Self {
            memory_mb: config.memory_threshold_mb,
        }
    }
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self { memory_mb: 500.0 }
    }
}

// == Checks ==
#[derive(Debug, Clone, Serialize)]
pub struct MemoryCheck {
    pub status: CheckStatus,
    pub used_mb: f64,
    pub threshold_mb: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CpuCheck {
    pub status: CheckStatus,
    /// One-minute load average
    pub load_average: f64,
    pub cores: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheCheck {
    pub status: CheckStatus,
    pub connected: bool,
    /// `redis` or `memory`; None when the store could not describe itself
    pub backend: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UptimeCheck {
    pub status: CheckStatus,
    pub process_secs: u64,
    pub os_secs: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub memory: MemoryCheck,
    pub cpu: CpuCheck,
    pub cache: CacheCheck,
    pub uptime: UptimeCheck,
}

// == Health Report ==
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Warning if any single check warns
    pub status: CheckStatus,
    pub timestamp: String,
    pub checks: HealthChecks,
}

impl HealthReport {
    /// 200 when healthy, 206 when any check warns.
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            CheckStatus::Healthy => StatusCode::OK,
            CheckStatus::Warning => StatusCode::PARTIAL_CONTENT,
        }
    }
}

/// Evaluates the checks against an already taken sample.
pub fn evaluate_health(
    system: &SystemStats,
    cache: Option<&CacheStoreStats>,
    thresholds: HealthThresholds,
) -> HealthReport {
    let memory = MemoryCheck {
        status: CheckStatus::from_ok(system.memory_rss_mb < thresholds.memory_mb),
        used_mb: system.memory_rss_mb,
        threshold_mb: thresholds.memory_mb,
    };

    let load = system.load_average[0];
    let cpu = CpuCheck {
        status: CheckStatus::from_ok(load < system.cpu_count as f64),
        load_average: load,
        cores: system.cpu_count,
    };

    // A remote store that is configured but unreachable counts as disconnected
    let connected = cache.map(|c| c.connected() && !c.degraded()).unwrap_or(false);
    let cache = CacheCheck {
        status: CheckStatus::from_ok(connected),
        connected,
        backend: cache.map(CacheStoreStats::backend),
    };

    let uptime = UptimeCheck {
        status: CheckStatus::Healthy,
        process_secs: system.process_uptime_secs,
        os_secs: system.os_uptime_secs,
    };

    let all_healthy = [memory.status, cpu.status, cache.status, uptime.status]
        .iter()
        .all(|s| *s == CheckStatus::Healthy);

    HealthReport {
        status: CheckStatus::from_ok(all_healthy),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: HealthChecks {
            memory,
            cpu,
            cache,
            uptime,
        },
    }
}

/// Samples the system and the cache store, then evaluates the checks.
///
/// Fails only when the system sample itself cannot be taken.
pub async fn health_view(
    metrics: &MetricsRegistry,
    cache: &CacheStore,
    thresholds: HealthThresholds,
) -> Result<HealthReport, MetricsError> {
    let system = metrics.try_system_stats()?;
    let cache_stats = cache.get_stats().await;
    Ok(evaluate_health(&system, cache_stats.as_ref(), thresholds))
}
