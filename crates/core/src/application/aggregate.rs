// Result aggregation: per-build statistics and baseline comparison
//
// Single pass per benchmark:
//   1. summarize the baseline build first (regardless of map order)
//   2. every other build: summarize, compare to the baseline mean, classify
// Builds without a successful iteration are reported as failed and take no
// part in comparisons.

use tracing::{debug, warn};

use crate::domain::{
    relative_percent, BenchmarkResult, ComparisonStatus, ComparisonThreshold,
    InterpreterVersion, ProfilingData, StatisticalSummary, VersionMap, VersionResult, WorkloadId,
};

/// CPU usage of one successful run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    pub user_cpu_secs: f64,
    pub system_cpu_secs: f64,
    pub wall_secs: f64,
}

/// Raw measurements of one benchmark on one build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IterationSeries {
    /// Durations of successful iterations (seconds)
    pub durations: Vec<f64>,
    pub failures: usize,
    pub last_error: Option<String>,
    pub resources: Vec<ResourceSample>,
}

impl IterationSeries {
    pub fn record_success(&mut self, duration: f64, resources: Option<ResourceSample>) {
        self.durations.push(duration);
        if let Some(sample) = resources {
            self.resources.push(sample);
        }
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.failures += 1;
        self.last_error = Some(error.into());
    }
}

/// Aggregates raw series into compared results
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    baseline: InterpreterVersion,
    threshold: ComparisonThreshold,
}

impl ResultAggregator {
    pub fn new(baseline: InterpreterVersion, threshold: ComparisonThreshold) -> Self {
        Self {
            baseline,
            threshold,
        }
    }

    pub fn baseline(&self) -> &InterpreterVersion {
        &self.baseline
    }

    pub fn threshold(&self) -> ComparisonThreshold {
        self.threshold
    }

    /// Compare a mean against the baseline mean
    ///
    /// Returns the relative figure and its status; `NoBaseline` when there is
    /// no usable baseline mean.
    pub fn compare(&self, mean: f64, baseline_mean: Option<f64>) -> (Option<f64>, ComparisonStatus) {
        match baseline_mean.and_then(|b| relative_percent(mean, b)) {
            Some(relative) => (Some(relative), self.threshold.classify(relative)),
            None => (None, ComparisonStatus::NoBaseline),
        }
    }

    /// Process the results of all builds for one benchmark
    pub fn process_benchmark_results(
        &self,
        workload: &WorkloadId,
        series: &VersionMap<IterationSeries>,
    ) -> BenchmarkResult {
        let baseline_stats = series
            .get(&self.baseline)
            .and_then(|s| StatisticalSummary::from_samples(&s.durations));

        if baseline_stats.is_none() {
            warn!(
                workload = %workload,
                baseline = %self.baseline,
                "Baseline produced no successful iteration, relative figures unavailable"
            );
        }

        let mut versions = VersionMap::new();
        for (version, raw) in series.iter() {
            let Some(stats) = StatisticalSummary::from_samples(&raw.durations) else {
                warn!(
                    workload = %workload,
                    version = %version,
                    failures = raw.failures,
                    "No successful iteration"
                );
                versions.insert(
                    version.clone(),
                    VersionResult::failed(raw.failures, raw.last_error.clone()),
                );
                continue;
            };

            let (relative_performance, status) = if *version == self.baseline {
                (None, ComparisonStatus::Baseline)
            } else {
                self.compare(stats.mean, baseline_stats.as_ref().map(|b| b.mean))
            };

            debug!(
                workload = %workload,
                version = %version,
                mean = stats.mean,
                stddev = stats.stddev,
                relative = ?relative_performance,
                status = %status,
                "Benchmark results processed"
            );

            versions.insert(
                version.clone(),
                VersionResult {
                    status,
                    duration: Some(stats.mean),
                    relative_performance,
                    statistics: Some(stats),
                    failures: raw.failures,
                    error: raw.last_error.clone(),
                    profiling: summarize_resources(&raw.resources),
                },
            );
        }

        BenchmarkResult {
            workload: workload.clone(),
            versions,
        }
    }
}

/// Mean CPU usage over the runs that reported it
pub fn summarize_resources(samples: &[ResourceSample]) -> Option<ProfilingData> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let user: f64 = samples.iter().map(|s| s.user_cpu_secs).sum();
    let system: f64 = samples.iter().map(|s| s.system_cpu_secs).sum();
    let wall: f64 = samples.iter().map(|s| s.wall_secs).sum();

    Some(ProfilingData {
        samples: samples.len(),
        mean_user_cpu_secs: user / n,
        mean_system_cpu_secs: system / n,
        cpu_utilization: if wall > 0.0 { (user + system) / wall } else { 0.0 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(label: &str) -> InterpreterVersion {
        InterpreterVersion::parse(label).unwrap()
    }

    fn id() -> WorkloadId {
        WorkloadId::new("cpu/recursive/test_fibonacci").unwrap()
    }

    fn series(durations: &[f64]) -> IterationSeries {
        IterationSeries {
            durations: durations.to_vec(),
            ..IterationSeries::default()
        }
    }

    fn aggregator() -> ResultAggregator {
        ResultAggregator::new(v("3.12.7"), ComparisonThreshold::default())
    }

    #[test]
    fn test_classifies_against_baseline() {
        let input: VersionMap<IterationSeries> = [
            (v("3.12.7"), series(&[1.0, 1.0, 1.0])),
            (v("3.13.0"), series(&[0.8, 0.8])),
            (v("3.13.0t"), series(&[1.5, 1.5])),
        ]
        .into_iter()
        .collect();

        let result = aggregator().process_benchmark_results(&id(), &input);

        let base = result.versions.get(&v("3.12.7")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Baseline);
        assert_eq!(base.relative_performance, None);
        assert_eq!(base.duration, Some(1.0));

        let faster = result.versions.get(&v("3.13.0")).unwrap();
        assert_eq!(faster.status, ComparisonStatus::Improved);
        assert_eq!(faster.relative_display().as_deref(), Some("80.00%"));

        let slower = result.versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(slower.status, ComparisonStatus::Degraded);
        assert_eq!(slower.relative_display().as_deref(), Some("150.00%"));
    }

    #[test]
    fn test_baseline_processed_first_regardless_of_order() {
        let input: VersionMap<IterationSeries> = [
            (v("3.13.0t"), series(&[1.05])),
            (v("3.12.7"), series(&[1.0])),
        ]
        .into_iter()
        .collect();

        let result = aggregator().process_benchmark_results(&id(), &input);
        let ft = result.versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.status, ComparisonStatus::Similar);

        let order: Vec<_> = result.versions.keys().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["3.13.0t", "3.12.7"]);
    }

    #[test]
    fn test_missing_baseline_yields_no_baseline() {
        let mut failed_base = IterationSeries::default();
        failed_base.record_failure("exit code 1: ImportError");
        failed_base.record_failure("exit code 1: ImportError");

        let input: VersionMap<IterationSeries> = [
            (v("3.12.7"), failed_base),
            (v("3.13.0"), series(&[0.5])),
        ]
        .into_iter()
        .collect();

        let result = aggregator().process_benchmark_results(&id(), &input);

        let base = result.versions.get(&v("3.12.7")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Failed);
        assert_eq!(base.failures, 2);
        assert_eq!(base.error.as_deref(), Some("exit code 1: ImportError"));

        let other = result.versions.get(&v("3.13.0")).unwrap();
        assert_eq!(other.status, ComparisonStatus::NoBaseline);
        assert!(other.relative_performance.is_none());
        assert_eq!(other.duration, Some(0.5));
    }

    #[test]
    fn test_partial_failures_keep_statistics() {
        let mut flaky = series(&[1.0, 1.2]);
        flaky.record_failure("timeout");

        let input: VersionMap<IterationSeries> =
            [(v("3.12.7"), flaky)].into_iter().collect();
        let result = aggregator().process_benchmark_results(&id(), &input);
        let base = result.versions.get(&v("3.12.7")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Baseline);
        assert_eq!(base.failures, 1);
        assert_eq!(base.statistics.as_ref().unwrap().count(), 2);
    }

    #[test]
    fn test_summarize_resources() {
        assert!(summarize_resources(&[]).is_none());

        let data = summarize_resources(&[
            ResourceSample {
                user_cpu_secs: 3.0,
                system_cpu_secs: 1.0,
                wall_secs: 1.0,
            },
            ResourceSample {
                user_cpu_secs: 1.0,
                system_cpu_secs: 1.0,
                wall_secs: 1.0,
            },
        ])
        .unwrap();
        assert_eq!(data.samples, 2);
        assert_eq!(data.mean_user_cpu_secs, 2.0);
        assert_eq!(data.mean_system_cpu_secs, 1.0);
        assert_eq!(data.cpu_utilization, 3.0);
    }
}
