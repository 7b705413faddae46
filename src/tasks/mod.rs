//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: removes expired fallback entries and probes the remote store
//! - System sampler: appends resource samples to the metrics time series
//! - Metrics cleanup: drops metric entries idle past the configured age

mod cleanup;
mod sampler;

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::api::AppState;
use crate::config::Config;

pub use cleanup::{spawn_metrics_cleanup_task, spawn_sweep_task};
pub use sampler::spawn_sampler_task;

/// Shortest period a background task will run at.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// `interval` floored to [`MIN_PERIOD`]; tokio's interval panics on zero.
fn period(interval: Duration) -> Duration {
    interval.max(MIN_PERIOD)
}

/// Handles of every background task started by [`start`].
pub struct BackgroundTasks {
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    /// Aborts all tasks.
    pub fn stop(self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!("Stopped {} background tasks", self.handles.len());
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// Starts the cache sweep, system sampler and metrics cleanup tasks.
pub fn start(state: &AppState, config: &Config) -> BackgroundTasks {
    let handles = vec![
        spawn_sweep_task(state.cache.clone(), Duration::from_secs(config.sweep_interval)),
        spawn_sampler_task(
            state.metrics.clone(),
            Duration::from_secs(config.sample_interval),
        ),
        spawn_metrics_cleanup_task(
            state.metrics.clone(),
            Duration::from_secs(config.metrics_cleanup_interval),
            Duration::from_secs(config.metrics_max_age),
        ),
    ];

    BackgroundTasks { handles }
}
