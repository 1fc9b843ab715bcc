// Scaling aggregation: speedup and parallel efficiency per worker count
//
// For every build, durations are grouped by (series, workers) across
// iterations. Speedup is the mean single-worker duration over the mean
// duration at that point; efficiency is speedup per worker. Each point is then
// compared with the baseline build at the same (series, workers).

use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::aggregate::ResultAggregator;
use crate::domain::{
    ComparisonStatus, ScalingOutput, ScalingPointResult, ScalingResult, ScalingVersionResult,
    StatisticalSummary, VersionMap, WorkloadId,
};

/// Parsed outputs of one scaling workload on one build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingSeries {
    pub outputs: Vec<ScalingOutput>,
    pub failures: usize,
    pub last_error: Option<String>,
}

impl ScalingSeries {
    pub fn record_success(&mut self, output: ScalingOutput) {
        self.outputs.push(output);
    }

    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.failures += 1;
        self.last_error = Some(error.into());
    }
}

impl ResultAggregator {
    /// Process the scaling results of all builds for one workload
    pub fn process_scaling_results(
        &self,
        workload: &WorkloadId,
        series: &VersionMap<ScalingSeries>,
    ) -> ScalingResult {
        let summarized: VersionMap<ScalingVersionResult> = series
            .iter()
            .map(|(version, raw)| (version.clone(), summarize_version(workload, raw)))
            .collect();

        let baseline_points: Vec<(String, u32, f64)> = summarized
            .get(self.baseline())
            .filter(|b| b.status != ComparisonStatus::Failed)
            .map(|b| {
                b.points
                    .iter()
                    .map(|p| (p.series.clone(), p.workers, p.duration.mean))
                    .collect()
            })
            .unwrap_or_default();

        let versions = summarized
            .into_iter()
            .map(|(version, mut result)| {
                if result.status == ComparisonStatus::Failed {
                    return (version, result);
                }
                if version == *self.baseline() {
                    result.status = ComparisonStatus::Baseline;
                    for point in &mut result.points {
                        point.status = ComparisonStatus::Baseline;
                    }
                    return (version, result);
                }

                let mut relatives = Vec::new();
                for point in &mut result.points {
                    let baseline_mean = baseline_points
                        .iter()
                        .find(|(s, w, _)| *s == point.series && *w == point.workers)
                        .map(|(_, _, mean)| *mean);
                    let (relative, status) = self.compare(point.duration.mean, baseline_mean);
                    point.relative_performance = relative;
                    point.status = status;
                    relatives.extend(relative);
                }

                result.status = if relatives.is_empty() {
                    ComparisonStatus::NoBaseline
                } else {
                    let mean_relative = relatives.iter().sum::<f64>() / relatives.len() as f64;
                    self.threshold().classify(mean_relative)
                };

                debug!(
                    workload = %workload,
                    version = %version,
                    compared_points = relatives.len(),
                    status = %result.status,
                    "Scaling results processed"
                );
                (version, result)
            })
            .collect();

        ScalingResult {
            workload: workload.clone(),
            versions,
        }
    }
}

fn summarize_version(workload: &WorkloadId, raw: &ScalingSeries) -> ScalingVersionResult {
    let baseline_durations: Vec<f64> = raw.outputs.iter().map(|o| o.baseline_duration).collect();
    let Some(baseline) = StatisticalSummary::from_samples(&baseline_durations) else {
        warn!(
            workload = %workload,
            failures = raw.failures,
            "No successful scaling iteration"
        );
        return ScalingVersionResult::failed(raw.failures, raw.last_error.clone());
    };

    let mut grouped: BTreeMap<(String, u32), Vec<f64>> = BTreeMap::new();
    for point in raw.outputs.iter().flat_map(|o| o.points.iter()) {
        grouped
            .entry((point.series.clone(), point.workers))
            .or_default()
            .push(point.duration);
    }

    let points = grouped
        .into_iter()
        .filter_map(|((series, workers), durations)| {
            let duration = StatisticalSummary::from_samples(&durations)?;
            let speedup = baseline.mean / duration.mean;
            Some(ScalingPointResult {
                series,
                workers,
                speedup,
                efficiency: speedup / f64::from(workers),
                duration,
                relative_performance: None,
                status: ComparisonStatus::NoBaseline,
            })
        })
        .collect();

    ScalingVersionResult {
        status: ComparisonStatus::NoBaseline,
        baseline: Some(baseline),
        points,
        failures: raw.failures,
        error: raw.last_error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonThreshold, InterpreterVersion, ScalingPoint, DEFAULT_SERIES};

    fn v(label: &str) -> InterpreterVersion {
        InterpreterVersion::parse(label).unwrap()
    }

    fn id() -> WorkloadId {
        WorkloadId::new("test_lock_contention_scaling").unwrap()
    }

    fn output(baseline: f64, points: &[(u32, f64)]) -> ScalingOutput {
        ScalingOutput {
            test_name: None,
            free_threading: None,
            baseline_duration: baseline,
            points: points
                .iter()
                .map(|(workers, duration)| ScalingPoint {
                    series: DEFAULT_SERIES.to_string(),
                    workers: *workers,
                    duration: *duration,
                })
                .collect(),
        }
    }

    fn ok(outputs: Vec<ScalingOutput>) -> ScalingSeries {
        ScalingSeries {
            outputs,
            ..ScalingSeries::default()
        }
    }

    fn aggregator() -> ResultAggregator {
        ResultAggregator::new(v("3.13.0"), ComparisonThreshold::default())
    }

    #[test]
    fn test_speedup_and_efficiency_across_iterations() {
        let input: VersionMap<ScalingSeries> = [(
            v("3.13.0"),
            ok(vec![
                output(1.0, &[(2, 0.5), (4, 1.0)]),
                output(1.0, &[(2, 0.5), (4, 1.0)]),
            ]),
        )]
        .into_iter()
        .collect();

        let result = aggregator().process_scaling_results(&id(), &input);
        let base = result.versions.get(&v("3.13.0")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Baseline);
        assert_eq!(base.baseline.as_ref().unwrap().mean, 1.0);

        let two = base.point(DEFAULT_SERIES, 2).unwrap();
        assert_eq!(two.speedup, 2.0);
        assert_eq!(two.efficiency, 1.0);
        assert_eq!(two.duration.count(), 2);

        let four = base.point(DEFAULT_SERIES, 4).unwrap();
        assert_eq!(four.efficiency, 0.25);
        assert_eq!(base.peak_speedup().unwrap().workers, 2);
    }

    #[test]
    fn test_points_compared_at_same_worker_count() {
        let input: VersionMap<ScalingSeries> = [
            (v("3.13.0"), ok(vec![output(1.0, &[(2, 1.0), (4, 1.0)])])),
            (v("3.13.0t"), ok(vec![output(1.0, &[(2, 0.5), (8, 0.2)])])),
        ]
        .into_iter()
        .collect();

        let result = aggregator().process_scaling_results(&id(), &input);
        let ft = result.versions.get(&v("3.13.0t")).unwrap();

        let two = ft.point(DEFAULT_SERIES, 2).unwrap();
        assert_eq!(two.relative_performance, Some(50.0));
        assert_eq!(two.status, ComparisonStatus::Improved);

        // 8 workers were never measured on the baseline build
        let eight = ft.point(DEFAULT_SERIES, 8).unwrap();
        assert_eq!(eight.relative_performance, None);
        assert_eq!(eight.status, ComparisonStatus::NoBaseline);

        assert_eq!(ft.status, ComparisonStatus::Improved);
    }

    #[test]
    fn test_failed_builds() {
        let mut failed = ScalingSeries::default();
        failed.record_failure("Malformed scaling output: missing positive baseline.duration");

        let input: VersionMap<ScalingSeries> = [
            (v("3.13.0"), failed),
            (v("3.13.0t"), ok(vec![output(1.0, &[(2, 0.5)])])),
        ]
        .into_iter()
        .collect();

        let result = aggregator().process_scaling_results(&id(), &input);
        let base = result.versions.get(&v("3.13.0")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Failed);
        assert_eq!(base.failures, 1);

        let ft = result.versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.status, ComparisonStatus::NoBaseline);
        assert_eq!(ft.point(DEFAULT_SERIES, 2).unwrap().speedup, 2.0);
    }
}
