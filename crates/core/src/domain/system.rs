// Host and checkout context recorded with every run

use serde::{Deserialize, Serialize};

/// CPU frequency in MHz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuFrequency {
    pub current: f64,
}

/// Host description recorded in every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Logical CPUs
    pub cpu_count: usize,
    /// CPUs usable by workloads (affinity, `CPU_SET`, `BENCHMARK_CPU_CORES`)
    pub available_cores: usize,
    /// `available_cores * BENCHMARK_THREAD_LIMIT`
    pub total_threads: usize,
    /// Bytes
    pub memory_total: u64,
    pub os_info: String,
    pub cpu_brand: String,
    pub cpu_freq: CpuFrequency,
    /// 1, 5 and 15 minute load averages
    pub load_avg: [f64; 3],
}

/// Revision of the harness checkout a run was produced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub branch: String,
    pub commit: String,
}
