// Per-benchmark results across interpreter builds

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::comparison::{format_relative, ComparisonStatus};
use super::stats::StatisticalSummary;
use super::version::InterpreterVersion;
use super::workload::WorkloadId;

/// Resource usage aggregated over the iterations of one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingData {
    pub samples: usize,
    pub mean_user_cpu_secs: f64,
    pub mean_system_cpu_secs: f64,
    /// CPU time / wall time; above 1.0 the workload ran in parallel
    pub cpu_utilization: f64,
}

/// Map keyed by interpreter version, in configured interpreter order
///
/// Serialized as a JSON object whose keys keep insertion order.
pub type VersionMap<T> = IndexMap<InterpreterVersion, T>;

/// Outcome of one benchmark on one interpreter build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionResult {
    pub status: ComparisonStatus,
    /// Mean duration in seconds
    pub duration: Option<f64>,
    /// Mean duration relative to the baseline mean, in percent
    pub relative_performance: Option<f64>,
    pub statistics: Option<StatisticalSummary>,
    pub failures: usize,
    pub error: Option<String>,
    pub profiling: Option<ProfilingData>,
}

impl VersionResult {
    pub fn failed(failures: usize, error: Option<String>) -> Self {
        Self {
            status: ComparisonStatus::Failed,
            duration: None,
            relative_performance: None,
            statistics: None,
            failures,
            error,
            profiling: None,
        }
    }

    /// Relative figure as printed in reports (`"93.41%"`)
    pub fn relative_display(&self) -> Option<String> {
        self.relative_performance.map(format_relative)
    }
}

/// Results of one timing benchmark across all builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub workload: WorkloadId,
    pub versions: VersionMap<VersionResult>,
}
