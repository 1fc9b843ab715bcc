// Harness settings
// Plain data with defaults; layering (file, environment, flags) happens in the CLI

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::constants::{
    DEFAULT_BASELINE, DEFAULT_BENCHMARK_DIR, DEFAULT_INTERPRETERS, DEFAULT_ITERATIONS,
    DEFAULT_SCALING_DIR,
};
use crate::domain::comparison::DEFAULT_THRESHOLD_PERCENT;
use crate::domain::{InterpreterVersion, ProfileLevel, TimingSource};
use crate::error::{AppError, Result};

/// One interpreter build to measure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpreterSpec {
    pub version: String,
    /// Skip pyenv discovery and use this binary
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl InterpreterSpec {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            path: None,
        }
    }
}

/// Harness settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub interpreters: Vec<InterpreterSpec>,
    pub baseline: String,
    pub iterations: usize,
    pub threshold_percent: f64,
    pub timeout_secs: Option<f64>,
    pub profile: ProfileLevel,
    pub timing: TimingSource,
    pub benchmark_dir: PathBuf,
    pub scaling_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Exported to workloads as `BENCHMARK_CPU_CORES`
    pub cpu_cores: Option<String>,
    /// Exported to workloads as `BENCHMARK_THREAD_LIMIT`
    pub thread_limit: Option<u32>,
    /// Python source run before every workload script (e.g. `import gc; gc.disable()`)
    pub preload: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interpreters: DEFAULT_INTERPRETERS
                .iter()
                .map(|v| InterpreterSpec::new(*v))
                .collect(),
            baseline: DEFAULT_BASELINE.to_string(),
            iterations: DEFAULT_ITERATIONS,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            timeout_secs: None,
            profile: ProfileLevel::default(),
            timing: TimingSource::default(),
            benchmark_dir: PathBuf::from(DEFAULT_BENCHMARK_DIR),
            scaling_dir: PathBuf::from(DEFAULT_SCALING_DIR),
            output_dir: PathBuf::from("."),
            cpu_cores: None,
            thread_limit: None,
            preload: None,
        }
    }
}

impl Settings {
    /// Check the settings and parse version labels
    ///
    /// # Errors
    /// - AppError::Config for a bad label, a duplicate build, a baseline that is
    ///   not measured, zero iterations or a non-positive threshold/timeout
    pub fn validate(&self) -> Result<Vec<InterpreterVersion>> {
        if self.iterations == 0 {
            return Err(AppError::Config("iterations must be at least 1".into()));
        }
        if !(self.threshold_percent > 0.0 && self.threshold_percent < 100.0) {
            return Err(AppError::Config(format!(
                "threshold_percent must be in (0, 100), got {}",
                self.threshold_percent
            )));
        }
        if let Some(timeout) = self.timeout_secs {
            // try_from also rejects NaN, infinity and values beyond Duration::MAX
            if !(timeout > 0.0 && std::time::Duration::try_from_secs_f64(timeout).is_ok()) {
                return Err(AppError::Config(format!(
                    "timeout_secs must be a positive number of seconds, got {timeout}"
                )));
            }
        }
        if let Some(cores) = &self.cpu_cores {
            if cores != "all" && cores.parse::<u32>().map_or(true, |n| n == 0) {
                return Err(AppError::Config(format!(
                    "cpu_cores must be \"all\" or a positive number, got {cores:?}"
                )));
            }
        }
        if self.interpreters.is_empty() {
            return Err(AppError::Config("no interpreters configured".into()));
        }

        let mut versions = Vec::with_capacity(self.interpreters.len());
        for spec in &self.interpreters {
            let version = InterpreterVersion::parse(spec.version.as_str())
                .map_err(|e| AppError::Config(e.to_string()))?;
            if versions.contains(&version) {
                return Err(AppError::Config(format!(
                    "interpreter {version} configured twice"
                )));
            }
            versions.push(version);
        }

        let baseline = self.baseline_version()?;
        if !versions.contains(&baseline) {
            return Err(AppError::Config(format!(
                "baseline {baseline} is not among the configured interpreters"
            )));
        }
        Ok(versions)
    }

    pub fn baseline_version(&self) -> Result<InterpreterVersion> {
        InterpreterVersion::parse(self.baseline.as_str()).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Per-run timeout; `None` when unset or not representable
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_secs
            .and_then(|secs| std::time::Duration::try_from_secs_f64(secs).ok())
    }
}
