//! Stats Views
//!
//! Category-selected stats and the full report merging metrics with cache
//! connectivity.

use std::str::FromStr;

use serde::Serialize;

use crate::cache::{CacheStore, CacheStoreStats};
use crate::error::MetricsError;
use crate::metrics::{
    CacheOpStats, MetricsRegistry, PerformanceReport, QueryStats, RequestStats, SystemStats,
};

/// Entries per list in the summary view.
pub const SUMMARY_LIMIT: usize = 10;

// == Stats Category ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsCategory {
    Requests,
    Database,
    Cache,
    System,
}

impl FromStr for StatsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "requests" => Ok(StatsCategory::Requests),
            "database" => Ok(StatsCategory::Database),
            "cache" => Ok(StatsCategory::Cache),
            "system" => Ok(StatsCategory::System),
            other => Err(format!(
                "Unknown stats category '{}', expected requests, database, cache or system",
                other
            )),
        }
    }
}

// == Views ==
/// Capped overview of every category.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub requests: Vec<RequestStats>,
    pub database: Vec<QueryStats>,
    pub cache: Vec<CacheOpStats>,
    pub system: SystemStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StatsView {
    Requests(Vec<RequestStats>),
    Database(Vec<QueryStats>),
    Cache(Vec<CacheOpStats>),
    System(SystemStats),
    Summary(StatsSummary),
}

/// Builds the view for one category, or the summary when none is given.
pub fn stats_view(
    metrics: &MetricsRegistry,
    category: Option<StatsCategory>,
) -> Result<StatsView, MetricsError> {
    let view = match category {
        Some(StatsCategory::Requests) => StatsView::Requests(metrics.get_request_stats()),
        Some(StatsCategory::Database) => StatsView::Database(metrics.get_database_stats()),
        Some(StatsCategory::Cache) => StatsView::Cache(metrics.get_cache_stats()),
        Some(StatsCategory::System) => StatsView::System(metrics.try_system_stats()?),
        None => StatsView::Summary(StatsSummary {
            requests: capped(metrics.get_request_stats()),
            database: capped(metrics.get_database_stats()),
            cache: capped(metrics.get_cache_stats()),
            system: metrics.try_system_stats()?,
        }),
    };
    Ok(view)
}

fn capped<T>(mut items: Vec<T>) -> Vec<T> {
    items.truncate(SUMMARY_LIMIT);
    items
}

// == Full Report ==
/// Uncapped performance report plus the cache store's own stats.
#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    #[serde(flatten)]
    pub performance: PerformanceReport,
    pub cache_store: Option<CacheStoreStats>,
}

pub async fn full_report(metrics: &MetricsRegistry, cache: &CacheStore) -> FullReport {
    FullReport {
        performance: metrics.get_performance_report(),
        cache_store: cache.get_stats().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!("requests".parse::<StatsCategory>(), Ok(StatsCategory::Requests));
        assert_eq!("Database".parse::<StatsCategory>(), Ok(StatsCategory::Database));
        assert_eq!("CACHE".parse::<StatsCategory>(), Ok(StatsCategory::Cache));
        assert_eq!("system".parse::<StatsCategory>(), Ok(StatsCategory::System));
        assert!("disk".parse::<StatsCategory>().is_err());
    }

    #[test]
    fn test_summary_caps_lists() {
        let metrics = MetricsRegistry::new();
        for i in 0..15 {
            metrics.record_request("GET", &format!("/page/{}", i), 1.0, 200);
        }

        match stats_view(&metrics, None).unwrap() {
            StatsView::Summary(summary) => {
                assert_eq!(summary.requests.len(), SUMMARY_LIMIT);
                assert!(summary.database.is_empty());
            }
            other => panic!("expected summary, got {:?}", other),
        }

        match stats_view(&metrics, Some(StatsCategory::Requests)).unwrap() {
            StatsView::Requests(all) => assert_eq!(all.len(), 15),
            other => panic!("expected requests, got {:?}", other),
        }
    }

    #[test]
    fn test_category_view_serializes_as_list() {
        let metrics = MetricsRegistry::new();
        metrics.record_database_query("SELECT * FROM products", 50.0, 10);

        let view = stats_view(&metrics, Some(StatsCategory::Database)).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["query_type"], "SELECT");
    }

    #[tokio::test]
    async fn test_full_report_includes_cache_store() {
        let metrics = MetricsRegistry::new();
        let cache = CacheStore::new(3600);
        cache.initialize().await;
        cache.set("k", "v", None).await;

        let report = full_report(&metrics, &cache).await;
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("timestamp").is_some());
        assert!(json.get("requests").is_some());
        assert_eq!(json["cache_store"]["type"], "memory");
        assert_eq!(json["cache_store"]["keys"], 1);
    }
}
