//! Metrics Registry Module
//!
//! In-process aggregation of request, query and cache-operation timings,
//! plus a bounded time series of system samples.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::records::{
    CacheOpMetric, CacheOpStats, QueryKind, QueryMetric, QueryStats, RequestMetric, RequestStats,
};
use super::system::{SystemSampler, SystemSnapshot, SystemStats};
use crate::error::MetricsError;
use crate::time::current_timestamp_ms;

/// Samples older than this are dropped from the time series.
pub const HISTORY_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

// == Performance Report ==
/// Every category of stats taken at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// RFC 3339 report time
    pub timestamp: String,
    pub requests: Vec<RequestStats>,
    pub database: Vec<QueryStats>,
    pub cache: Vec<CacheOpStats>,
    pub system: SystemStats,
}

// == Metrics Registry ==
/// Aggregates timings for requests, queries and cache operations.
///
/// All recording is synchronous; locks are held for a single map update.
pub struct MetricsRegistry {
    requests: RwLock<HashMap<String, RequestMetric>>,
    queries: RwLock<HashMap<QueryKind, QueryMetric>>,
    cache_ops: RwLock<HashMap<String, CacheOpMetric>>,
    history: RwLock<BTreeMap<u64, SystemSnapshot>>,
    sampler: Mutex<SystemSampler>,
}

impl MetricsRegistry {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
            queries: RwLock::new(HashMap::new()),
            cache_ops: RwLock::new(HashMap::new()),
            history: RwLock::new(BTreeMap::new()),
            sampler: Mutex::new(SystemSampler::new()),
        }
    }

    // == Recording ==
    /// Records one completed HTTP request under `METHOD:path`.
    pub fn record_request(&self, method: &str, path: &str, duration_ms: f64, status_code: u16) {
        let key = format!("{}:{}", method, path);
        let now = current_timestamp_ms();

        self.requests
            .write()
            .entry(key)
            .or_insert_with(|| RequestMetric::new(method, path))
            .observe(duration_ms, status_code, now);
    }

    /// Records one storage query, grouped by its leading verb.
    pub fn record_database_query(&self, query: &str, duration_ms: f64, row_count: u64) {
        let kind = QueryKind::classify(query);
        let now = current_timestamp_ms();

        self.queries
            .write()
            .entry(kind)
            .or_insert_with(QueryMetric::new)
            .observe(duration_ms, row_count, now);
    }

    /// Records one cache operation under `cache:<operation>`.
    ///
    /// `hit` only matters for `get`.
    pub fn record_cache_operation(&self, operation: &str, key: &str, hit: bool, duration_ms: f64) {
        trace!(operation, key, hit, duration_ms, "cache operation");
        let now = current_timestamp_ms();

        self.cache_ops
            .write()
            .entry(format!("cache:{}", operation))
            .or_insert_with(CacheOpMetric::new)
            .observe(operation == "get", hit, duration_ms, now);
    }

    // == Read Side ==
    /// Per-endpoint stats, busiest first.
    pub fn get_request_stats(&self) -> Vec<RequestStats> {
        let mut stats: Vec<RequestStats> = self
            .requests
            .read()
            .iter()
            .map(|(key, metric)| metric.to_stats(key))
            .collect();

        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.endpoint.cmp(&b.endpoint)));
        stats
    }

    /// Per-verb query stats, slowest average first.
    pub fn get_database_stats(&self) -> Vec<QueryStats> {
        let mut stats: Vec<QueryStats> = self
            .queries
            .read()
            .iter()
            .map(|(kind, metric)| metric.to_stats(*kind))
            .collect();

        stats.sort_by(|a, b| {
            b.avg_duration
                .total_cmp(&a.avg_duration)
                .then_with(|| a.query_type.cmp(&b.query_type))
        });
        stats
    }

    /// Per-operation cache stats, ordered by operation name.
    pub fn get_cache_stats(&self) -> Vec<CacheOpStats> {
        let mut stats: Vec<CacheOpStats> = self
            .cache_ops
            .read()
            .iter()
            .map(|(op, metric)| metric.to_stats(op))
            .collect();

        stats.sort_by(|a, b| a.operation.cmp(&b.operation));
        stats
    }

    /// Fresh system sample, or the error that prevented it.
    pub fn try_system_stats(&self) -> Result<SystemStats, MetricsError> {
        self.sampler.lock().sample()
    }

    /// Fresh system sample; an empty one (timestamp only) if sampling failed.
    pub fn get_system_stats(&self) -> SystemStats {
        self.try_system_stats().unwrap_or_else(|e| {
            warn!("System sampling failed: {}", e);
            SystemStats {
                timestamp: current_timestamp_ms(),
                ..SystemStats::default()
            }
        })
    }

    /// All categories in one structure.
    pub fn get_performance_report(&self) -> PerformanceReport {
        PerformanceReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            requests: self.get_request_stats(),
            database: self.get_database_stats(),
            cache: self.get_cache_stats(),
            system: self.get_system_stats(),
        }
    }

    // == Time Series ==
    /// Samples the system into the time series and prunes samples past retention.
    pub fn sample_system(&self) -> Result<(), MetricsError> {
        let snapshot = self.try_system_stats()?;
        let cutoff = snapshot
            .timestamp
            .saturating_sub(HISTORY_RETENTION.as_millis() as u64);

        let mut history = self.history.write();
        history.insert(snapshot.timestamp, snapshot);
        // split_off keeps keys >= cutoff
        let kept = history.split_off(&cutoff);
        *history = kept;
        Ok(())
    }

    /// Time-series samples, oldest first.
    pub fn system_history(&self) -> Vec<SystemSnapshot> {
        self.history.read().values().cloned().collect()
    }

    // == Cleanup ==
    /// Drops request, query and cache entries last touched before `now - max_age`.
    ///
    /// A zero `max_age` clears everything, including entries touched in the
    /// current millisecond. Returns the number of entries removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        if max_age.is_zero() {
            return self.clear();
        }

        let cutoff = current_timestamp_ms().saturating_sub(max_age.as_millis() as u64);
        self.cleanup_before(cutoff)
    }

    /// Drops every entry whose `last_access` is strictly before `cutoff_ms`.
    pub fn cleanup_before(&self, cutoff_ms: u64) -> usize {
        let mut removed = 0;

        {
            let mut requests = self.requests.write();
            let before = requests.len();
            requests.retain(|_, m| m.timing.last_access >= cutoff_ms);
            removed += before - requests.len();
        }
        {
            let mut queries = self.queries.write();
            let before = queries.len();
            queries.retain(|_, m| m.timing.last_access >= cutoff_ms);
            removed += before - queries.len();
        }
        {
            let mut cache_ops = self.cache_ops.write();
            let before = cache_ops.len();
            cache_ops.retain(|_, m| m.timing.last_access >= cutoff_ms);
            removed += before - cache_ops.len();
        }

        debug!("Metrics cleanup removed {} entries", removed);
        removed
    }

    fn clear(&self) -> usize {
        let removed = {
            let mut requests = self.requests.write();
            let mut queries = self.queries.write();
            let mut cache_ops = self.cache_ops.write();
            let n = requests.len() + queries.len() + cache_ops.len();
            requests.clear();
            queries.clear();
            cache_ops.clear();
            n
        };

        debug!("Metrics cleared ({} entries)", removed);
        removed
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}
