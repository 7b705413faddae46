//! System Sampling Module
//!
//! Point-in-time process and OS resource usage, read through sysinfo.

use std::time::Instant;

use serde::Serialize;
use sysinfo::{Pid, System};

use crate::error::MetricsError;
use crate::time::{current_timestamp_ms, round2};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

// == System Stats ==
/// Flat snapshot of process and OS resource usage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemStats {
    /// Sample time (Unix milliseconds)
    pub timestamp: u64,
    /// Resident set size of this process in MB
    pub memory_rss_mb: f64,
    /// Virtual memory of this process in MB
    pub memory_virtual_mb: f64,
    /// CPU usage of this process since the previous sample, in percent
    pub cpu_usage_percent: f64,
    /// CPU time this process has spent in user mode, in seconds
    pub cpu_user_secs: f64,
    /// CPU time this process has spent in kernel mode, in seconds
    pub cpu_system_secs: f64,
    pub cpu_count: usize,
    /// 1, 5 and 15 minute load averages
    pub load_average: [f64; 3],
    pub platform: String,
    pub arch: String,
    pub total_memory_gb: f64,
    pub free_memory_gb: f64,
    pub process_uptime_secs: u64,
    pub os_uptime_secs: u64,
}

/// A [`SystemStats`] kept in the registry's time series.
pub type SystemSnapshot = SystemStats;

// == System Sampler ==
/// Holds the sysinfo handle between samples so CPU usage has a baseline.
pub struct SystemSampler {
    system: System,
    pid: Option<Pid>,
    started: Instant,
}

impl SystemSampler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
            started: Instant::now(),
        }
    }

    /// Takes a fresh sample.
    pub fn sample(&mut self) -> Result<SystemStats, MetricsError> {
        let pid = self
            .pid
            .ok_or_else(|| MetricsError::ProcessNotFound("current pid unavailable".to_string()))?;

        self.system.refresh_memory();
        self.system.refresh_cpu();
        self.system.refresh_process(pid);

        let process = self
            .system
            .process(pid)
            .ok_or_else(|| MetricsError::ProcessNotFound(pid.to_string()))?;

        let load = System::load_average();
        let (cpu_user_secs, cpu_system_secs) = process_cpu_times().unwrap_or_default();

        Ok(SystemStats {
            timestamp: current_timestamp_ms(),
            memory_rss_mb: round2(process.memory() as f64 / BYTES_PER_MB),
            memory_virtual_mb: round2(process.virtual_memory() as f64 / BYTES_PER_MB),
            cpu_usage_percent: round2(process.cpu_usage() as f64),
            cpu_user_secs: round2(cpu_user_secs),
            cpu_system_secs: round2(cpu_system_secs),
            cpu_count: self.system.cpus().len(),
            load_average: [round2(load.one), round2(load.five), round2(load.fifteen)],
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            total_memory_gb: round2(self.system.total_memory() as f64 / BYTES_PER_GB),
            free_memory_gb: round2(self.system.free_memory() as f64 / BYTES_PER_GB),
            process_uptime_secs: self.started.elapsed().as_secs(),
            os_uptime_secs: System::uptime(),
        })
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// User and system CPU time consumed by this process, in seconds.
#[cfg(unix)]
fn process_cpu_times() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data and getrusage only writes into it
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    if unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) } != 0 {
        return None;
    }

    let secs = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some((secs(usage.ru_utime), secs(usage.ru_stime)))
}

#[cfg(not(unix))]
fn process_cpu_times() -> Option<(f64, f64)> {
    None
}

/// Resident memory of the current process in MB, if it can be read.
pub fn process_resident_mb() -> Option<f64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_process(pid);
    system
        .process(pid)
        .map(|p| round2(p.memory() as f64 / BYTES_PER_MB))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_reads_current_process() {
        let mut sampler = SystemSampler::new();
        let stats = sampler.sample().unwrap();

        assert!(stats.memory_rss_mb > 0.0);
        assert!(stats.cpu_count > 0);
        assert!(stats.total_memory_gb > 0.0);
        assert_eq!(stats.platform, std::env::consts::OS);
        assert!(stats.timestamp > 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_sample_reports_cpu_times() {
        // Burn some user time so the counter is visibly above zero
        let started = Instant::now();
        let mut acc = 0u64;
        while started.elapsed().as_millis() < 50 {
            acc = acc.wrapping_mul(31).wrapping_add(7);
        }
        std::hint::black_box(acc);

        let (user, system) = process_cpu_times().unwrap();
        assert!(user > 0.0);
        assert!(system >= 0.0);

        let stats = SystemSampler::new().sample().unwrap();
        assert!(stats.cpu_user_secs >= round2(user));
        assert!(stats.cpu_system_secs >= 0.0);
    }

    #[test]
    fn test_process_resident_mb() {
        let mb = process_resident_mb().unwrap();
        assert!(mb > 0.0);
    }
}
