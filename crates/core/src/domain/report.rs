// Run Report - the persisted record of one harness run

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::comparison::ComparisonStatus;
use super::result::{BenchmarkResult, ProfilingData, VersionMap};
use super::scaling::{ScalingResult, ScalingVersionResult};
use super::system::{GitInfo, SystemInfo};
use super::version::InterpreterVersion;
use super::workload::WorkloadId;
use super::DomainError;

/// Profiling depth requested for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileLevel {
    None,
    /// Timing only
    #[default]
    Basic,
    /// Timing plus child CPU usage
    Detailed,
}

impl fmt::Display for ProfileLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileLevel::None => write!(f, "none"),
            ProfileLevel::Basic => write!(f, "basic"),
            ProfileLevel::Detailed => write!(f, "detailed"),
        }
    }
}

impl FromStr for ProfileLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ProfileLevel::None),
            "basic" => Ok(ProfileLevel::Basic),
            "detailed" => Ok(ProfileLevel::Detailed),
            other => Err(DomainError::ValidationError(format!(
                "unknown profile level {other:?}"
            ))),
        }
    }
}

/// Where a timing sample comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingSource {
    /// Wall clock around the whole interpreter process (includes startup)
    #[default]
    Wall,
    /// `Duration: <secs>` line printed by the workload, wall clock as fallback
    Reported,
}

impl fmt::Display for TimingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingSource::Wall => write!(f, "wall"),
            TimingSource::Reported => write!(f, "reported"),
        }
    }
}

/// Parameters a run was produced with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub iterations: usize,
    pub baseline: InterpreterVersion,
    pub interpreters: Vec<InterpreterVersion>,
    pub profile_level: ProfileLevel,
    pub timing_source: TimingSource,
    pub threshold_percent: f64,
    pub timeout_secs: Option<f64>,
    /// Benchmarks named on the command line (empty = all)
    pub benchmarks: Vec<String>,
}

/// Per-version line of a benchmark summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub status: ComparisonStatus,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Run-to-run variance (stddev / mean, percent)
    pub cv_percent: Option<f64>,
    /// `"93.41%"`, absent for the baseline and when no baseline exists
    pub relative_perf: Option<String>,
    pub iterations: Vec<f64>,
    pub failures: usize,
    pub error: Option<String>,
}

/// One timing benchmark in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    pub summary: VersionMap<VersionSummary>,
    #[serde(default)]
    pub profiling: VersionMap<ProfilingData>,
}

impl From<&BenchmarkResult> for BenchmarkEntry {
    fn from(result: &BenchmarkResult) -> Self {
        let summary = result
            .versions
            .iter()
            .map(|(version, r)| {
                let stats = r.statistics.as_ref();
                let line = VersionSummary {
                    status: r.status,
                    mean: stats.map(|s| s.mean),
                    stddev: stats.map(|s| s.stddev),
                    median: stats.map(|s| s.median),
                    min: stats.map(|s| s.min),
                    max: stats.map(|s| s.max),
                    cv_percent: stats.and_then(|s| s.coefficient_of_variation()),
                    relative_perf: r.relative_display(),
                    iterations: stats.map(|s| s.iterations.clone()).unwrap_or_default(),
                    failures: r.failures,
                    error: r.error.clone(),
                };
                (version.clone(), line)
            })
            .collect();

        let profiling = result
            .versions
            .iter()
            .filter_map(|(version, r)| r.profiling.clone().map(|p| (version.clone(), p)))
            .collect();

        Self { summary, profiling }
    }
}

/// The persisted record of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub git_info: Option<GitInfo>,
    pub run_config: RunConfig,
    #[serde(default)]
    pub benchmarks: IndexMap<WorkloadId, BenchmarkEntry>,
    #[serde(default)]
    pub scaling: IndexMap<WorkloadId, VersionMap<ScalingVersionResult>>,
}

impl RunReport {
    pub fn new(
        run_id: impl Into<String>,
        created_at: DateTime<Utc>,
        system_info: SystemInfo,
        git_info: Option<GitInfo>,
        run_config: RunConfig,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            created_at,
            system_info,
            git_info,
            run_config,
            benchmarks: IndexMap::new(),
            scaling: IndexMap::new(),
        }
    }

    pub fn add_benchmarks<'a>(&mut self, results: impl IntoIterator<Item = &'a BenchmarkResult>) {
        for result in results {
            self.benchmarks
                .insert(result.workload.clone(), BenchmarkEntry::from(result));
        }
    }

    pub fn add_scaling<'a>(&mut self, results: impl IntoIterator<Item = &'a ScalingResult>) {
        for result in results {
            self.scaling
                .insert(result.workload.clone(), result.versions.clone());
        }
    }

    /// Versions in report order: configured interpreters first, then any
    /// extra version found in results
    pub fn versions(&self) -> Vec<InterpreterVersion> {
        let mut versions = self.run_config.interpreters.clone();
        let found = self
            .benchmarks
            .values()
            .flat_map(|entry| entry.summary.keys())
            .chain(self.scaling.values().flat_map(|v| v.keys()));
        for version in found {
            if !versions.contains(version) {
                versions.push(version.clone());
            }
        }
        versions
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            created_at: self.created_at,
            system_info: self.system_info.clone(),
            git_info: self.git_info.clone(),
            benchmark_count: self.benchmarks.len(),
            scaling_count: self.scaling.len(),
        }
    }
}

/// Index entry of a stored run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub git_info: Option<GitInfo>,
    pub benchmark_count: usize,
    pub scaling_count: usize,
}
