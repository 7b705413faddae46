//! Cleanup Tasks
//!
//! Periodic removal of stale state: expired fallback entries (plus a remote
//! probe while the cache runs in fallback mode) and idle metric entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::period;
use crate::cache::{BackingMode, CacheStore};
use crate::metrics::MetricsRegistry;

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::new(3600));
/// let sweep_handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<CacheStore>, interval: Duration) -> JoinHandle<()> {
    let interval = period(interval);
    tokio::spawn(async move {
        info!("Starting cache sweep task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired().await;
            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }

            if cache.mode() == BackingMode::Fallback && cache.probe_remote().await {
                info!("Cache sweep: remote cache reachable again");
            }
        }
    })
}

/// Spawns a task that drops metric entries idle for longer than `max_age`, every `interval`.
pub fn spawn_metrics_cleanup_task(
    metrics: Arc<MetricsRegistry>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()> {
    let interval = period(interval);
    tokio::spawn(async move {
        info!(
            "Starting metrics cleanup task with interval of {:?}, max age {:?}",
            interval, max_age
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = metrics.cleanup(max_age);
            if removed > 0 {
                info!("Metrics cleanup: removed {} idle entries", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::remote::fake::FakeRemote;

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = Arc::new(CacheStore::new(300));
        cache.set("expire_soon", "value", Some(1)).await;

        let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(1));

        // Wait for entry to expire and the sweep to run
        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Checked through len so the lazy eviction in get does not mask the sweep
        assert_eq!(cache.len().await, 0, "Expired entry should have been swept");

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = Arc::new(CacheStore::new(300));
        cache.set("long_lived", "value", Some(3600)).await;

        let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(
            cache.get::<String>("long_lived").await.as_deref(),
            Some("value"),
            "Valid entry should not be removed"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_reconnects_remote() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_reachable(false);
        let cache = Arc::new(CacheStore::new(300).with_remote(remote.clone()));
        cache.initialize().await;
        assert_eq!(cache.mode(), BackingMode::Fallback);

        remote.set_reachable(true);
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(cache.mode(), BackingMode::Remote);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let cache = Arc::new(CacheStore::new(300));

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }

    #[tokio::test]
    async fn test_metrics_cleanup_task_drops_idle_entries() {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.record_request("GET", "/idle", 1.0, 200);

        let handle = spawn_metrics_cleanup_task(
            metrics.clone(),
            Duration::from_millis(200),
            Duration::from_millis(50),
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        handle.abort();

        assert!(metrics.get_request_stats().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_task_zero_interval_keeps_running() {
        let cache = Arc::new(CacheStore::new(300));
        cache.set("expire_soon", "value", Some(1)).await;

        let handle = spawn_sweep_task(cache.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!handle.is_finished());
        assert_eq!(cache.len().await, 0);

        handle.abort();
    }
}
