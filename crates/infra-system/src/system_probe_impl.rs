// System probe implementation
// reason: sysinfo for cross-platform host information, nix for CPU affinity
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use sysinfo::System;
use tracing::debug;

use pybench_core::application::constants::{ENV_CPU_CORES, ENV_CPU_SET, ENV_THREAD_LIMIT};
use pybench_core::domain::{CpuFrequency, GitInfo, SystemInfo};
use pybench_core::port::SystemProbe;

use crate::git;

/// System probe implementation using sysinfo
pub struct SystemProbeImpl {
    system: Arc<Mutex<System>>,
    cpu_cores: Option<String>,
    thread_limit: Option<i64>,
    repo_dir: PathBuf,
}

impl SystemProbeImpl {
    /// Create a probe reading core and thread limits from the environment
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new_all())),
            cpu_cores: std::env::var(ENV_CPU_CORES).ok(),
            thread_limit: std::env::var(ENV_THREAD_LIMIT)
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            repo_dir: PathBuf::from("."),
        }
    }

    /// Override the limits exported to workloads
    pub fn with_limits(mut self, cpu_cores: Option<String>, thread_limit: Option<u32>) -> Self {
        if cpu_cores.is_some() {
            self.cpu_cores = cpu_cores;
        }
        if let Some(limit) = thread_limit {
            self.thread_limit = Some(i64::from(limit));
        }
        self
    }

    /// Checkout whose branch and commit are recorded
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = dir.into();
        self
    }
}

impl Default for SystemProbeImpl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SystemProbe for SystemProbeImpl {
    async fn system_info(&self) -> SystemInfo {
        let (cpu_count, memory_total, cpu_brand, cpu_freq) = {
            let mut sys = match self.system.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            sys.refresh_cpu();
            sys.refresh_memory();
            let first = sys.cpus().first();
            (
                sys.cpus().len(),
                sys.total_memory(),
                first.map(|c| c.brand().trim().to_string()).unwrap_or_default(),
                first.map(|c| c.frequency() as f64).unwrap_or(0.0),
            )
        };

        let cpu_set = std::env::var(ENV_CPU_SET).ok();
        let available_cores = available_cores(
            affinity_cores(),
            cpu_set.as_deref(),
            cpu_count,
            self.cpu_cores.as_deref(),
        );
        let load = System::load_average();

        let info = SystemInfo {
            cpu_count,
            available_cores,
            total_threads: total_threads(available_cores, self.thread_limit),
            memory_total,
            os_info: format!(
                "{} {}",
                System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
                System::kernel_version().unwrap_or_default()
            )
            .trim()
            .to_string(),
            cpu_brand,
            cpu_freq: CpuFrequency { current: cpu_freq },
            load_avg: [load.one, load.five, load.fifteen],
        };

        debug!(
            cpu_count = info.cpu_count,
            available_cores = info.available_cores,
            total_threads = info.total_threads,
            memory_total = info.memory_total,
            "System information collected"
        );
        info
    }

    async fn git_info(&self) -> Option<GitInfo> {
        git::git_info(&self.repo_dir).await
    }
}

/// CPUs in this process's affinity mask
#[cfg(target_os = "linux")]
fn affinity_cores() -> Option<usize> {
    use nix::sched::{sched_getaffinity, CpuSet};
    use nix::unistd::Pid;

    let set = sched_getaffinity(Pid::from_raw(0)).ok()?;
    let count = (0..CpuSet::count())
        .filter(|cpu| set.is_set(*cpu).unwrap_or(false))
        .count();
    (count > 0).then_some(count)
}

#[cfg(not(target_os = "linux"))]
fn affinity_cores() -> Option<usize> {
    None
}

/// Parse a CPU list such as `0-3` or `0,1,2,3` into a core count
pub fn parse_cpu_set(spec: &str) -> Option<usize> {
    let mut cores = std::collections::BTreeSet::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.trim().parse().ok()?;
                let end: usize = end.trim().parse().ok()?;
                if end < start {
                    return None;
                }
                cores.extend(start..=end);
            }
            None => {
                cores.insert(part.parse::<usize>().ok()?);
            }
        }
    }
    (!cores.is_empty()).then_some(cores.len())
}

/// Cores workloads may use
///
/// Affinity first, then `CPU_SET`, then the logical CPU count; capped by the
/// `BENCHMARK_CPU_CORES` value unless it is `all` (or unparsable).
pub fn available_cores(
    affinity: Option<usize>,
    cpu_set: Option<&str>,
    logical: usize,
    cpu_cores: Option<&str>,
) -> usize {
    let detected = affinity
        .or_else(|| cpu_set.and_then(parse_cpu_set))
        .unwrap_or(logical);
    match cpu_cores.map(str::trim) {
        Some("all") | None => detected,
        Some(limit) => limit
            .parse::<usize>()
            .map(|n| n.min(detected))
            .unwrap_or(detected),
    }
}

/// `cores * thread_limit`; a missing or non-positive limit counts as one thread per core
pub fn total_threads(cores: usize, thread_limit: Option<i64>) -> usize {
    match thread_limit {
        Some(limit) if limit > 0 => cores * usize::try_from(limit).unwrap_or(1),
        _ => cores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_info() {
        let probe = SystemProbeImpl::new().with_limits(Some("1".into()), Some(2));
        let info = probe.system_info().await;

        assert!(info.cpu_count >= 1);
        assert!(info.memory_total > 0);
        assert_eq!(info.available_cores, 1);
        assert_eq!(info.total_threads, 2);
    }

    #[test]
    fn test_parse_cpu_set() {
        assert_eq!(parse_cpu_set("0-3"), Some(4));
        assert_eq!(parse_cpu_set("0,1,2,3"), Some(4));
        assert_eq!(parse_cpu_set("0-1,4,6-7"), Some(5));
        assert_eq!(parse_cpu_set("0-1,1"), Some(2));
        assert_eq!(parse_cpu_set(""), None);
        assert_eq!(parse_cpu_set("a-b"), None);
        assert_eq!(parse_cpu_set("3-1"), None);
    }

    #[test]
    fn test_available_cores_precedence() {
        assert_eq!(available_cores(Some(4), Some("0-7"), 16, None), 4);
        assert_eq!(available_cores(None, Some("0-7"), 16, None), 8);
        assert_eq!(available_cores(None, None, 16, Some("all")), 16);
        assert_eq!(available_cores(None, None, 16, Some("6")), 6);
        assert_eq!(available_cores(Some(4), None, 16, Some("32")), 4);
        assert_eq!(available_cores(None, Some("garbage"), 16, Some("many")), 16);
    }

    #[test]
    fn test_total_threads() {
        assert_eq!(total_threads(4, None), 4);
        assert_eq!(total_threads(4, Some(2)), 8);
        assert_eq!(total_threads(4, Some(0)), 4);
        assert_eq!(total_threads(4, Some(-1)), 4);
    }
}
