// Scaling workloads: stdout document parsing and aggregated results
//
// A scaling workload prints one JSON document:
//   { "metadata": {...}, "baseline": {"duration": s},
//     "scaling_tests": [ {"threads": n, "duration": s}, ... ] }
// Entries may instead carry several series as nested `<series>_results`
// objects (e.g. `thread_results`, `process_results`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::comparison::ComparisonStatus;
use super::error::{DomainError, Result};
use super::result::VersionMap;
use super::stats::StatisticalSummary;
use super::workload::WorkloadId;

/// Series name for entries with a single top-level duration
pub const DEFAULT_SERIES: &str = "default";

const POINT_ARRAY_KEYS: [&str; 2] = ["scaling_tests", "scaling_results"];
const WORKER_COUNT_KEYS: [&str; 4] = ["threads", "workers", "processes", "num_threads"];
const SERIES_SUFFIX: &str = "_results";

/// One measured worker count of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPoint {
    pub series: String,
    pub workers: u32,
    pub duration: f64,
}

/// Parsed stdout of one scaling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingOutput {
    pub test_name: Option<String>,
    pub free_threading: Option<bool>,
    /// Single-worker reference duration measured by the workload itself
    pub baseline_duration: f64,
    pub points: Vec<ScalingPoint>,
}

impl ScalingOutput {
    /// Parse the document printed by a scaling workload.
    ///
    /// Tolerates log lines around the document.
    pub fn parse(stdout: &str) -> Result<Self> {
        let value = extract_document(stdout)?;
        let root = value
            .as_object()
            .ok_or_else(|| malformed("document is not a JSON object"))?;

        let metadata = root.get("metadata").and_then(Value::as_object);
        if let Some(error) = metadata.and_then(|m| m.get("error")).and_then(Value::as_str) {
            return Err(malformed(format!("workload reported error: {error}")));
        }

        let baseline_duration = root
            .get("baseline")
            .and_then(|b| b.get("duration"))
            .and_then(Value::as_f64)
            .filter(|d| *d > 0.0)
            .ok_or_else(|| malformed("missing positive baseline.duration"))?;

        let entries = POINT_ARRAY_KEYS
            .iter()
            .find_map(|key| root.get(*key).and_then(Value::as_array))
            .ok_or_else(|| malformed("missing scaling_tests array"))?;

        let mut points = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match parse_entry(entry) {
                Some(mut entry_points) => points.append(&mut entry_points),
                None => warn!(index, "Skipping scaling entry without worker count or duration"),
            }
        }

        Ok(Self {
            test_name: metadata
                .and_then(|m| m.get("test_name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            free_threading: metadata
                .and_then(|m| m.get("free_threading"))
                .and_then(Value::as_bool),
            baseline_duration,
            points,
        })
    }
}

fn malformed(msg: impl Into<String>) -> DomainError {
    DomainError::MalformedScalingOutput(msg.into())
}

fn extract_document(stdout: &str) -> Result<Value> {
    let trimmed = stdout.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    // Last top-level object wins; braces in log lines that do not parse are skipped
    let mut document = None;
    let mut pos = 0;
    while let Some(offset) = trimmed[pos..].find('{') {
        let start = pos + offset;
        let mut stream = serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if value.is_object() => {
                pos = start + stream.byte_offset();
                document = Some(value);
            }
            _ => pos = start + 1,
        }
    }
    document.ok_or_else(|| malformed("no JSON object in output"))
}

fn parse_entry(entry: &Value) -> Option<Vec<ScalingPoint>> {
    let obj = entry.as_object()?;
    let workers = WORKER_COUNT_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_u64))
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())?;

    // Nested series win over a top-level duration (which then duplicates one of them)
    let nested = nested_series(obj, workers);
    if !nested.is_empty() {
        return Some(nested);
    }

    let duration = positive_duration(obj)?;
    Some(vec![ScalingPoint {
        series: DEFAULT_SERIES.to_string(),
        workers,
        duration,
    }])
}

fn nested_series(obj: &Map<String, Value>, workers: u32) -> Vec<ScalingPoint> {
    obj.iter()
        .filter_map(|(key, value)| {
            let series = key.strip_suffix(SERIES_SUFFIX).filter(|s| !s.is_empty())?;
            let duration = positive_duration(value.as_object()?)?;
            Some(ScalingPoint {
                series: series.to_string(),
                workers,
                duration,
            })
        })
        .collect()
}

fn positive_duration(obj: &Map<String, Value>) -> Option<f64> {
    obj.get("duration")
        .and_then(Value::as_f64)
        .filter(|d| *d > 0.0)
}

/// Aggregated measurements of one `(series, workers)` point on one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingPointResult {
    pub series: String,
    pub workers: u32,
    pub duration: StatisticalSummary,
    /// Mean single-worker duration / mean duration at this point
    pub speedup: f64,
    /// Speedup per worker (1.0 is perfect linear scaling)
    pub efficiency: f64,
    /// Mean duration relative to the baseline build at the same point
    pub relative_performance: Option<f64>,
    pub status: ComparisonStatus,
}

/// Scaling results of one workload on one build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingVersionResult {
    pub status: ComparisonStatus,
    /// Single-worker reference durations across iterations
    pub baseline: Option<StatisticalSummary>,
    pub points: Vec<ScalingPointResult>,
    pub failures: usize,
    pub error: Option<String>,
}

impl ScalingVersionResult {
    pub fn failed(failures: usize, error: Option<String>) -> Self {
        Self {
            status: ComparisonStatus::Failed,
            baseline: None,
            points: Vec::new(),
            failures,
            error,
        }
    }

    pub fn point(&self, series: &str, workers: u32) -> Option<&ScalingPointResult> {
        self.points
            .iter()
            .find(|p| p.series == series && p.workers == workers)
    }

    /// Highest speedup reached by any point
    pub fn peak_speedup(&self) -> Option<&ScalingPointResult> {
        self.points
            .iter()
            .max_by(|a, b| a.speedup.total_cmp(&b.speedup))
    }
}

/// Scaling results of one workload across all builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingResult {
    pub workload: WorkloadId,
    pub versions: VersionMap<ScalingVersionResult>,
}
