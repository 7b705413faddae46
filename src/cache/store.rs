//! Cache Store Module
//!
//! Key/value cache that delegates to a remote store while it is reachable and
//! serves from an in-process expiry map otherwise.
//!
//! Every public operation is total: failures are logged and collapse to a
//! neutral default (`None` / `false`). The `try_*` variants return the
//! underlying [`CacheError`] for callers that need to tell an absent key
//! from an unreachable backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock as SyncRwLock;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::remote::{RedisRemote, RemoteCache};
use crate::cache::{
    BackingMode, CacheEntry, CacheStoreStats, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::metrics::{process_resident_mb, MetricsRegistry};
use crate::time::current_timestamp_ms;

// == Remote Connector ==
/// How the store obtains its remote client.
enum RemoteConnector {
    /// No remote store configured
    None,
    /// Connect to this URL on initialize / probe
    Url { url: String, timeout: Duration },
    /// Pre-built client, checked with PING
    Client(Arc<dyn RemoteCache>),
}

// == Cache Store ==
/// Dual-mode cache store.
pub struct CacheStore {
    /// Fallback map used while no remote store is reachable
    local: RwLock<HashMap<String, CacheEntry>>,
    /// Currently active backing store
    mode: SyncRwLock<BackingMode>,
    /// Connected remote client, kept across fallback periods for probing
    remote: SyncRwLock<Option<Arc<dyn RemoteCache>>>,
    connector: RemoteConnector,
    metrics: Option<Arc<MetricsRegistry>>,
    /// TTL in seconds used when a caller passes none
    default_ttl: u64,
}

impl CacheStore {
    // == Constructors ==
    /// Creates a store in fallback mode with no remote configured.
    pub fn new(default_ttl: u64) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            mode: SyncRwLock::new(BackingMode::Fallback),
            remote: SyncRwLock::new(None),
            connector: RemoteConnector::None,
            metrics: None,
            default_ttl,
        }
    }

    /// Creates a store from configuration; `initialize` connects to the remote URL if set.
    pub fn from_config(config: &Config) -> Self {
        let store = Self::new(config.default_ttl);
        match &config.redis_url {
            Some(url) => store.with_remote_url(url.clone(), config.connect_timeout()),
            None => store,
        }
    }

    /// Uses a remote store at `url`, connected on `initialize`.
    pub fn with_remote_url(mut self, url: String, timeout: Duration) -> Self {
        self.connector = RemoteConnector::Url { url, timeout };
        self
    }

    /// Uses an already constructed remote client.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.connector = RemoteConnector::Client(remote);
        self
    }

    /// Records hit/miss and timing of every operation in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    // == Lifecycle ==
    /// Attempts to reach the configured remote store.
    ///
    /// Leaves the store in fallback mode when no remote is configured or the
    /// connection fails. Never fails itself.
    pub async fn initialize(&self) {
        if matches!(self.connector, RemoteConnector::None) {
            info!("No remote cache configured, using in-memory cache");
            self.transition(BackingMode::Fallback, "no remote configured");
            return;
        }

        match self.connect_remote().await {
            Ok(()) => info!("Remote cache connected"),
            Err(e) => warn!("Remote cache unavailable, using in-memory cache: {}", e),
        }
    }

    /// Re-checks the remote store while in fallback mode and switches back on success.
    ///
    /// Returns true when the store ends up in remote mode.
    pub async fn probe_remote(&self) -> bool {
        match self.mode() {
            BackingMode::Remote => true,
            BackingMode::Fallback => {
                if matches!(self.connector, RemoteConnector::None) {
                    return false;
                }
                match self.connect_remote().await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!("Remote cache still unavailable: {}", e);
                        false
                    }
                }
            }
        }
    }

    async fn connect_remote(&self) -> Result<()> {
        let existing = self.remote.read().clone();

        if let Some(client) = existing {
            match client.ping().await {
                Ok(()) => {
                    self.transition(BackingMode::Remote, "remote reachable");
                    return Ok(());
                }
                // A dropped multiplexed connection does not recover; dial again
                Err(_) if matches!(self.connector, RemoteConnector::Url { .. }) => {
                    *self.remote.write() = None;
                }
                Err(e) => return Err(e),
            }
        }

        let client: Arc<dyn RemoteCache> = match &self.connector {
            RemoteConnector::None => {
                return Err(CacheError::Unavailable("no remote configured".to_string()))
            }
            RemoteConnector::Client(client) => client.clone(),
            RemoteConnector::Url { url, timeout } => {
                Arc::new(RedisRemote::connect(url, *timeout).await?)
            }
        };

        client.ping().await?;
        *self.remote.write() = Some(client);
        self.transition(BackingMode::Remote, "remote reachable");
        Ok(())
    }

    // == Mode ==
    /// Currently active backing store.
    pub fn mode(&self) -> BackingMode {
        *self.mode.read()
    }

    /// Single transition point between remote and fallback mode.
    fn transition(&self, to: BackingMode, reason: &str) {
        let mut mode = self.mode.write();
        if *mode != to {
            match to {
                BackingMode::Remote => info!("Cache switched to {} mode: {}", to, reason),
                BackingMode::Fallback => warn!("Cache switched to {} mode: {}", to, reason),
            }
            *mode = to;
        }
    }

    fn active_remote(&self) -> Option<Arc<dyn RemoteCache>> {
        match self.mode() {
            BackingMode::Remote => self.remote.read().clone(),
            BackingMode::Fallback => None,
        }
    }

    /// Inspects a remote failure; connectivity loss moves the store to fallback.
    fn on_remote_error(&self, err: &CacheError) {
        if err.is_disconnect() {
            self.transition(BackingMode::Fallback, &err.to_string());
        }
    }

    fn record(&self, operation: &str, key: &str, hit: bool, started: Instant) {
        if let Some(metrics) = &self.metrics {
            let elapsed = started.elapsed().as_secs_f64() * 1000.0;
            metrics.record_cache_operation(operation, key, hit, elapsed);
        }
    }

    fn settle<T>(&self, operation: &str, key: &str, result: Result<T>, default: T) -> T {
        result.unwrap_or_else(|e| {
            warn!("Cache {} failed for key '{}': {}", operation, key, e);
            default
        })
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` seconds (default TTL when None).
    /// TTLs above [`MAX_TTL_SECONDS`] are clamped in both modes.
    ///
    /// Returns false if the value could not be stored.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        let result = self.try_set(key, value, ttl).await;
        self.settle("set", key, result.map(|_| true), false)
    }

    pub async fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<u64>,
    ) -> Result<()> {
        let started = Instant::now();
        let ttl = ttl.unwrap_or(self.default_ttl).min(MAX_TTL_SECONDS);
        let serialized = serde_json::to_string(value)?;

        let result = match self.active_remote() {
            // Redis rejects EX 0; a zero TTL means the value is already gone
            Some(remote) if ttl == 0 => remote.del(key).await.map(|_| ()),
            Some(remote) => remote.set_ex(key, &serialized, ttl).await,
            None => {
                let mut local = self.local.write().await;
                if ttl == 0 {
                    local.remove(key);
                } else {
                    local.insert(key.to_string(), CacheEntry::new(serialized, ttl));
                }
                Ok(())
            }
        };

        if let Err(e) = &result {
            self.on_remote_error(e);
        }
        self.record("set", key, false, started);
        result
    }

    // == Get ==
    /// Returns the value stored under `key`, or None if absent, expired or unreadable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let result = self.try_get(key).await;
        self.settle("get", key, result, None)
    }

    pub async fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let started = Instant::now();

        let result = match self.get_raw(key).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).map(Some).map_err(CacheError::from),
            Ok(None) => Ok(None),
            Err(e) => {
                self.on_remote_error(&e);
                Err(e)
            }
        };

        let hit = matches!(result, Ok(Some(_)));
        self.record("get", key, hit, started);
        result
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        if let Some(remote) = self.active_remote() {
            return remote.get(key).await;
        }

        let now = current_timestamp_ms();
        let mut local = self.local.write().await;
        match local.get(key) {
            Some(entry) if entry.is_expired_at(now) => {
                local.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    // == Delete ==
    /// Removes `key`; returns true if something was removed.
    pub async fn del(&self, key: &str) -> bool {
        let result = self.try_del(key).await;
        self.settle("del", key, result, false)
    }

    pub async fn try_del(&self, key: &str) -> Result<bool> {
        let started = Instant::now();

        let result = match self.active_remote() {
            Some(remote) => remote.del(key).await,
            None => Ok(self.local.write().await.remove(key).is_some()),
        };

        if let Err(e) = &result {
            self.on_remote_error(e);
        }
        self.record("del", key, false, started);
        result
    }

    // == Exists ==
    /// True when `key` holds a live value.
    pub async fn exists(&self, key: &str) -> bool {
        let result = self.try_exists(key).await;
        self.settle("exists", key, result, false)
    }

    pub async fn try_exists(&self, key: &str) -> Result<bool> {
        let started = Instant::now();

        let result = match self.active_remote() {
            Some(remote) => remote.exists(key).await,
            None => {
                let now = current_timestamp_ms();
                let mut local = self.local.write().await;
                match local.get(key) {
                    Some(entry) if entry.is_expired_at(now) => {
                        local.remove(key);
                        Ok(false)
                    }
                    Some(_) => Ok(true),
                    None => Ok(false),
                }
            }
        };

        if let Err(e) = &result {
            self.on_remote_error(e);
        }
        self.record("exists", key, false, started);
        result
    }

    // == Expire ==
    /// Resets the TTL of an existing key; no-op returning false for a missing key.
    pub async fn expire(&self, key: &str, ttl_seconds: u64) -> bool {
        let result = self.try_expire(key, ttl_seconds).await;
        self.settle("expire", key, result, false)
    }

    pub async fn try_expire(&self, key: &str, ttl_seconds: u64) -> Result<bool> {
        let started = Instant::now();
        let ttl_seconds = ttl_seconds.min(MAX_TTL_SECONDS);

        let result = match self.active_remote() {
            Some(remote) => remote.expire(key, ttl_seconds).await,
            None => {
                let now = current_timestamp_ms();
                let mut local = self.local.write().await;
                match local.get_mut(key) {
                    Some(entry) if entry.is_expired_at(now) => {
                        local.remove(key);
                        Ok(false)
                    }
                    Some(entry) => {
                        entry.refresh_expiry(ttl_seconds);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
        };

        if let Err(e) = &result {
            self.on_remote_error(e);
        }
        self.record("expire", key, false, started);
        result
    }

    // == Flush ==
    /// Clears the active backing store only; the inactive one keeps its data.
    pub async fn flush(&self) -> bool {
        let result = self.try_flush().await;
        self.settle("flush", "*", result.map(|_| true), false)
    }

    pub async fn try_flush(&self) -> Result<()> {
        let started = Instant::now();

        let result = match self.active_remote() {
            Some(remote) => remote.flush().await,
            None => {
                self.local.write().await.clear();
                Ok(())
            }
        };

        if let Err(e) = &result {
            self.on_remote_error(e);
        }
        self.record("flush", "*", false, started);
        result
    }

    // == Stats ==
    /// Describes the active backing store, or None if the description failed.
    pub async fn get_stats(&self) -> Option<CacheStoreStats> {
        let result = self.try_stats().await;
        self.settle("stats", "*", result.map(Some), None)
    }

    pub async fn try_stats(&self) -> Result<CacheStoreStats> {
        if let Some(remote) = self.active_remote() {
            return match remote.info().await {
                Ok(info) => Ok(CacheStoreStats::Redis {
                    connected: true,
                    info,
                }),
                Err(e) => {
                    self.on_remote_error(&e);
                    Err(e)
                }
            };
        }

        let local = self.local.read().await;
        let approx_bytes = local.iter().map(|(k, e)| k.len() + e.value.len()).sum();

        Ok(CacheStoreStats::Memory {
            connected: true,
            keys: local.len(),
            approx_bytes,
            remote_configured: !matches!(self.connector, RemoteConnector::None),
            process_memory_mb: process_resident_mb(),
        })
    }

    // == Sweep ==
    /// Removes all expired entries from the fallback map.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep_expired(&self) -> usize {
        let now = current_timestamp_ms();
        let mut local = self.local.write().await;
        if local.is_empty() {
            return 0;
        }

        let before = local.len();
        local.retain(|_, entry| !entry.is_expired_at(now));
        before - local.len()
    }

    // == Length ==
    /// Number of entries held by the fallback map.
    pub async fn len(&self) -> usize {
        self.local.read().await.len()
    }

    /// True if the fallback map holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.local.read().await.is_empty()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_SECONDS)
    }
}
