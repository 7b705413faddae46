//! Cache Statistics Module
//!
//! Descriptor of the active backing store returned by `CacheStore::get_stats`.

use serde::Serialize;

use super::remote::RemoteInfo;

// == Cache Store Stats ==
/// Mode-specific counters for the active backing store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheStoreStats {
    /// Remote mode: raw server info
    Redis {
        connected: bool,
        #[serde(flatten)]
        info: RemoteInfo,
    },
    /// Fallback mode: local map size and process memory
    Memory {
        connected: bool,
        /// Entries currently held, including not-yet-swept expired ones
        keys: usize,
        /// Approximate bytes held by keys and serialized values
        approx_bytes: usize,
        /// True when a remote store is configured but currently unreachable
        remote_configured: bool,
        /// Resident memory of the process in MB, when it could be sampled
        process_memory_mb: Option<f64>,
    },
}

impl CacheStoreStats {
    /// Name of the active backing store.
    pub fn backend(&self) -> &'static str {
        match self {
            CacheStoreStats::Redis { .. } => "redis",
            CacheStoreStats::Memory { .. } => "memory",
        }
    }

    /// Whether the store can currently serve operations.
    pub fn connected(&self) -> bool {
        match self {
            CacheStoreStats::Redis { connected, .. } | CacheStoreStats::Memory { connected, .. } => {
                *connected
            }
        }
    }

    /// True when running on the fallback map although a remote store is configured.
    pub fn degraded(&self) -> bool {
        matches!(
            self,
            CacheStoreStats::Memory {
                remote_configured: true,
                ..
            }
        )
    }
}
