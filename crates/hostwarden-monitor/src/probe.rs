//! Host metric sources.

use std::fs;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use sysinfo::{ProcessRefreshKind, System, UpdateKind};
use tracing::debug;

use crate::error::MonitorError;

/// `/proc/stat` CPU states reported in the breakdown, in column order.
pub const CPU_STATES: [&str; 8] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal",
];

/// CPU utilization over one sampling window.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSample {
    /// Busy share of the window, 0-100.
    pub percent: f64,
    /// Share of the window spent in each state, in percent. Empty when the
    /// platform has no breakdown.
    pub states: Vec<(String, f64)>,
}

/// Virtual memory snapshot; sizes in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MemorySample {
    pub percent: f64,
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub buffers: u64,
    pub cached: u64,
}

/// Source of CPU and memory samples.
pub trait SystemProbe: Send + Sync {
    /// Sample CPU usage; blocks for `window`.
    fn cpu(&self, window: Duration) -> Result<CpuSample, MonitorError>;

    /// Sample memory usage.
    fn memory(&self) -> Result<MemorySample, MonitorError>;
}

/// Answers whether a process is running.
pub trait ProcessLister: Send + Sync {
    /// True if any running process has `pattern` in its name, executable
    /// file name or command line.
    fn is_running(&self, pattern: &str) -> bool;
}

/// Probe backed by `sysinfo`, with `/proc` for the figures it does not
/// expose.
pub struct HostProbe {
    system: Mutex<System>,
}

impl HostProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for HostProbe {
    fn cpu(&self, window: Duration) -> Result<CpuSample, MonitorError> {
        let window = window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        let mut system = self.system();

        let before = read_proc_stat();
        system.refresh_cpu();
        thread::sleep(window);
        system.refresh_cpu();
        let after = read_proc_stat();

        let percent = f64::from(system.global_cpu_info().cpu_usage());
        if !percent.is_finite() {
            return Err(MonitorError::collection("cpu", "usage is not a number"));
        }

        let states = match (before, after) {
            (Some(before), Some(after)) => cpu_state_shares(&before, &after),
            _ => Vec::new(),
        };
        debug!("CPU usage over {:?}: {:.2}%", window, percent);

        Ok(CpuSample { percent, states })
    }

    fn memory(&self) -> Result<MemorySample, MonitorError> {
        let mut system = self.system();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(MonitorError::collection(
                "memory",
                "total memory reported as zero",
            ));
        }
        let available = system.available_memory();
        let (buffers, cached) = fs::read_to_string("/proc/meminfo")
            .map(|text| parse_meminfo_buffers_cached(&text))
            .unwrap_or((0, 0));

        Ok(MemorySample {
            percent: memory_percent(total, available),
            total,
            available,
            used: system.used_memory(),
            free: system.free_memory(),
            buffers,
            cached,
        })
    }
}

impl ProcessLister for HostProbe {
    fn is_running(&self, pattern: &str) -> bool {
        let mut system = self.system();
        // The plain refresh leaves cmd and exe empty, and the kernel name
        // is cut to 15 bytes.
        system.refresh_processes_specifics(
            ProcessRefreshKind::new()
                .with_cmd(UpdateKind::OnlyIfNotSet)
                .with_exe(UpdateKind::OnlyIfNotSet),
        );
        system.processes().values().any(|process| {
            process.name().contains(pattern)
                || process
                    .exe()
                    .and_then(|exe| exe.file_name())
                    .is_some_and(|name| name.to_string_lossy().contains(pattern))
                || process.cmd().iter().any(|arg| arg.contains(pattern))
        })
    }
}

/// Used share of memory, in percent.
pub fn memory_percent(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(available) as f64 * 100.0 / total as f64
}

fn read_proc_stat() -> Option<Vec<u64>> {
    fs::read_to_string("/proc/stat")
        .ok()
        .and_then(|text| parse_proc_stat(&text))
}

/// Aggregate CPU tick counters from the `cpu ` line of `/proc/stat`.
pub fn parse_proc_stat(text: &str) -> Option<Vec<u64>> {
    let line = text.lines().find(|line| line.starts_with("cpu "))?;
    let ticks: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(CPU_STATES.len())
        .map(|field| field.parse().ok())
        .collect::<Option<_>>()?;
    (ticks.len() >= 4).then_some(ticks)
}

/// Percentage of the elapsed ticks spent in each state.
pub fn cpu_state_shares(before: &[u64], after: &[u64]) -> Vec<(String, f64)> {
    let deltas: Vec<u64> = before
        .iter()
        .zip(after)
        .map(|(b, a)| a.saturating_sub(*b))
        .collect();
    let elapsed: u64 = deltas.iter().sum();
    if elapsed == 0 {
        return Vec::new();
    }

    CPU_STATES
        .iter()
        .zip(&deltas)
        .map(|(state, delta)| (state.to_string(), *delta as f64 * 100.0 / elapsed as f64))
        .collect()
}

/// `Buffers` and `Cached` from `/proc/meminfo`, in bytes.
pub fn parse_meminfo_buffers_cached(text: &str) -> (u64, u64) {
    let mut buffers = 0;
    let mut cached = 0;
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kib) = value.parse::<u64>() else {
            continue;
        };
        match key {
            "Buffers:" => buffers = kib * 1024,
            "Cached:" => cached = kib * 1024,
            _ => {}
        }
    }
    (buffers, cached)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "\
cpu  100 0 50 800 50 0 0 0 0 0
cpu0 50 0 25 400 25 0 0 0 0 0
intr 12345
";

    #[test]
    fn test_parse_proc_stat() {
        let ticks = parse_proc_stat(PROC_STAT).unwrap();
        assert_eq!(ticks, vec![100, 0, 50, 800, 50, 0, 0, 0]);
    }

    #[test]
    fn test_parse_proc_stat_rejects_garbage() {
        assert!(parse_proc_stat("intr 1\n").is_none());
        assert!(parse_proc_stat("cpu  a b c d\n").is_none());
        assert!(parse_proc_stat("cpu  1 2\n").is_none());
    }

    #[test]
    fn test_cpu_state_shares() {
        let before = vec![100, 0, 50, 800, 50, 0, 0, 0];
        let after = vec![130, 0, 60, 850, 60, 0, 0, 0];
        let shares = cpu_state_shares(&before, &after);

        assert_eq!(shares.len(), CPU_STATES.len());
        assert_eq!(shares[0], ("user".to_string(), 30.0));
        assert_eq!(shares[2], ("system".to_string(), 10.0));
        assert_eq!(shares[3], ("idle".to_string(), 50.0));
        assert_eq!(shares[4], ("iowait".to_string(), 10.0));
    }

    #[test]
    fn test_cpu_state_shares_without_progress() {
        let ticks = vec![1, 2, 3, 4];
        assert!(cpu_state_shares(&ticks, &ticks).is_empty());
    }

    #[test]
    fn test_parse_meminfo() {
        let text = "MemTotal:       16000000 kB\nBuffers:          2048 kB\nCached:         1048576 kB\nSwapCached:          0 kB\n";
        assert_eq!(parse_meminfo_buffers_cached(text), (2048 * 1024, 1024 * 1024 * 1024));
        assert_eq!(parse_meminfo_buffers_cached(""), (0, 0));
    }

    #[test]
    fn test_memory_percent() {
        assert_eq!(memory_percent(200, 50), 75.0);
        assert_eq!(memory_percent(0, 0), 0.0);
        assert_eq!(memory_percent(100, 150), 0.0);
    }

    #[test]
    fn test_host_probe_memory() {
        let probe = HostProbe::new();
        let sample = probe.memory().unwrap();
        assert!(sample.total > 0);
        assert!((0.0..=100.0).contains(&sample.percent));
    }

    #[test]
    fn test_host_probe_sees_nonsense_as_missing() {
        let probe = HostProbe::new();
        assert!(!probe.is_running("hostwarden-no-such-process-7f3a9c"));
    }

    #[test]
    fn test_host_probe_finds_own_binary_by_full_file_name() {
        let exe = std::env::current_exe().unwrap();
        let file_name = exe.file_name().unwrap().to_string_lossy().into_owned();
        // Long enough that the kernel process name alone cannot match.
        assert!(file_name.len() > 15, "{}", file_name);

        let probe = HostProbe::new();
        assert!(probe.is_running(&file_name), "{} not found", file_name);
    }
}
