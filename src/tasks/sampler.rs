//! System Sampler Task
//!
//! Periodic system sampling into the registry's time series.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::period;
use crate::metrics::MetricsRegistry;

/// Spawns a task that samples system resources every `interval`.
///
/// The first sample is taken immediately.
pub fn spawn_sampler_task(metrics: Arc<MetricsRegistry>, interval: Duration) -> JoinHandle<()> {
    let interval = period(interval);
    tokio::spawn(async move {
        info!("Starting system sampler with interval of {:?}", interval);
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;

            match metrics.sample_system() {
                Ok(()) => debug!("System sample recorded"),
                Err(e) => warn!("System sample failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sampler_task_fills_history() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handle = spawn_sampler_task(metrics.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(180)).await;
        handle.abort();

        assert!(metrics.system_history().len() >= 2);
    }

    #[tokio::test]
    async fn test_sampler_task_survives_zero_interval() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handle = spawn_sampler_task(metrics.clone(), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished(), "Sampler should still be running");
        handle.abort();

        assert!(!metrics.system_history().is_empty());
    }
}
