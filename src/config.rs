//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Values are read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Remote cache connection URL, None = fallback mode only
    pub redis_url: Option<String>,
    /// Timeout for the initial remote cache connection in seconds
    pub redis_connect_timeout: u64,
    /// Default TTL in seconds for entries set without explicit TTL
    pub default_ttl: u64,
    /// Interval in seconds between local expiry sweeps
    pub sweep_interval: u64,
    /// Interval in seconds between system resource samples
    pub sample_interval: u64,
    /// Interval in seconds between metric cleanup runs
    pub metrics_cleanup_interval: u64,
    /// Age in seconds after which idle metric entries are dropped
    pub metrics_max_age: u64,
    /// Resident memory ceiling for the health check, in MB
    pub memory_threshold_mb: f64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `REDIS_URL` - Full remote cache URL; takes precedence over the host/port form
    /// - `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD` - Remote cache location (default: unset)
    /// - `REDIS_CONNECT_TIMEOUT` - Connect timeout in seconds (default: 5)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    ///
    /// Interval variables set to 0 fall back to their defaults.
    /// - `CACHE_SWEEP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `METRICS_SAMPLE_INTERVAL` - System sampling frequency in seconds (default: 60)
    /// - `METRICS_CLEANUP_INTERVAL` - Metric cleanup frequency in seconds (default: 3600)
    /// - `METRICS_MAX_AGE` - Idle metric age limit in seconds (default: 86400)
    /// - `HEALTH_MEMORY_THRESHOLD_MB` - Memory health ceiling (default: 500)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            redis_url: redis_url_from_env(),
            redis_connect_timeout: parse_var("REDIS_CONNECT_TIMEOUT")
                .unwrap_or(defaults.redis_connect_timeout),
            default_ttl: parse_var("CACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            sweep_interval: parse_interval("CACHE_SWEEP_INTERVAL")
                .unwrap_or(defaults.sweep_interval),
            sample_interval: parse_interval("METRICS_SAMPLE_INTERVAL")
                .unwrap_or(defaults.sample_interval),
            metrics_cleanup_interval: parse_interval("METRICS_CLEANUP_INTERVAL")
                .unwrap_or(defaults.metrics_cleanup_interval),
            metrics_max_age: parse_var("METRICS_MAX_AGE").unwrap_or(defaults.metrics_max_age),
            memory_threshold_mb: parse_var("HEALTH_MEMORY_THRESHOLD_MB")
                .unwrap_or(defaults.memory_threshold_mb),
        }
    }

    /// Connect timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_connect_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            redis_url: None,
            redis_connect_timeout: 5,
            default_ttl: 3600,
            sweep_interval: 60,
            sample_interval: 60,
            metrics_cleanup_interval: 3600,
            metrics_max_age: 86_400,
            memory_threshold_mb: 500.0,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Background task period in seconds; zero is rejected.
fn parse_interval(name: &str) -> Option<u64> {
    parse_var(name).filter(|secs: &u64| *secs > 0)
}

/// Builds the remote cache URL from `REDIS_URL` or the host/port/password triple.
fn redis_url_from_env() -> Option<String> {
    if let Ok(url) = env::var("REDIS_URL") {
        if !url.is_empty() {
            return Some(url);
        }
    }

    let host = env::var("REDIS_HOST").ok().filter(|h| !h.is_empty())?;
    let port: u16 = parse_var("REDIS_PORT").unwrap_or(6379);

    match env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()) {
        Some(password) => Some(format!("redis://:{}@{}:{}", password, host, port)),
        None => Some(format!("redis://{}:{}", host, port)),
    }
}
