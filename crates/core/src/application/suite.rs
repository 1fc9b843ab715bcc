// Benchmark Suite - runs workloads against every interpreter build
//
// Runs are strictly sequential (workload -> build -> iteration) so that
// measurements never compete for cores. Cancellation is checked before each
// run; a workload interrupted half-way is dropped from the results.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};

use super::aggregate::{IterationSeries, ResourceSample, ResultAggregator};
use super::constants::REPORTED_DURATION_PREFIX;
use super::scaling::ScalingSeries;
use super::shutdown::ShutdownToken;
use crate::domain::{
    BenchmarkResult, ComparisonThreshold, DomainError, InterpreterVersion, ProfileLevel, RunConfig,
    ScalingOutput, ScalingResult, TimingSource, VersionMap, Workload, WorkloadId,
};
use crate::error::{AppError, Result};
use crate::port::{
    Interpreter, NoopObserver, ProgressObserver, RunOutcome, RunRequest, WorkloadRunner,
};

/// Per-run settings shared by every workload of a suite
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    pub iterations: usize,
    pub timeout: Option<Duration>,
    pub timing_source: TimingSource,
    pub profile_level: ProfileLevel,
    /// Extra environment for every workload
    pub env: HashMap<String, String>,
    /// Python source executed before every workload script
    pub preload: Option<String>,
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            iterations: super::constants::DEFAULT_ITERATIONS,
            timeout: None,
            timing_source: TimingSource::default(),
            profile_level: ProfileLevel::default(),
            env: HashMap::new(),
            preload: None,
        }
    }
}

/// Runs workloads against interpreter builds and aggregates the outcome
pub struct BenchmarkSuite {
    interpreters: Vec<Interpreter>,
    aggregator: ResultAggregator,
    options: SuiteOptions,
    runner: Arc<dyn WorkloadRunner>,
    observer: Arc<dyn ProgressObserver>,
    shutdown: ShutdownToken,
}

impl BenchmarkSuite {
    /// Create a suite
    ///
    /// # Errors
    /// - AppError::Config if there is no interpreter, a build is listed twice
    ///   or iterations is zero
    /// - DomainError::MissingBaseline if the baseline is not one of the interpreters
    pub fn new(
        interpreters: Vec<Interpreter>,
        baseline: InterpreterVersion,
        threshold: ComparisonThreshold,
        options: SuiteOptions,
        runner: Arc<dyn WorkloadRunner>,
    ) -> Result<Self> {
        if options.iterations == 0 {
            return Err(AppError::Config("iterations must be at least 1".into()));
        }
        if interpreters.is_empty() {
            return Err(AppError::Config("no interpreters to benchmark".into()));
        }
        for (i, interpreter) in interpreters.iter().enumerate() {
            if interpreters[..i]
                .iter()
                .any(|other| other.version == interpreter.version)
            {
                return Err(AppError::Config(format!(
                    "interpreter {} listed twice",
                    interpreter.version
                )));
            }
        }
        if !interpreters.iter().any(|i| i.version == baseline) {
            return Err(DomainError::MissingBaseline(baseline.to_string()).into());
        }

        Ok(Self {
            interpreters,
            aggregator: ResultAggregator::new(baseline, threshold),
            options,
            runner,
            observer: Arc::new(NoopObserver),
            shutdown: ShutdownToken::never(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn interpreters(&self) -> &[Interpreter] {
        &self.interpreters
    }

    pub fn baseline(&self) -> &InterpreterVersion {
        self.aggregator.baseline()
    }

    /// Parameters recorded in the run report
    pub fn run_config(&self, benchmarks: Vec<String>) -> RunConfig {
        RunConfig {
            iterations: self.options.iterations,
            baseline: self.aggregator.baseline().clone(),
            interpreters: self.interpreters.iter().map(|i| i.version.clone()).collect(),
            profile_level: self.options.profile_level,
            timing_source: self.options.timing_source,
            threshold_percent: self.aggregator.threshold().percent,
            timeout_secs: self.options.timeout.map(|t| t.as_secs_f64()),
            benchmarks,
        }
    }

    /// Run timing workloads
    ///
    /// Returns one result per completed workload, in input order.
    pub async fn run_timing(&self, workloads: &[Workload]) -> Vec<BenchmarkResult> {
        self.observer.on_suite_start(self.total_runs(workloads));
        info!(
            workloads = workloads.len(),
            interpreters = self.interpreters.len(),
            iterations = self.options.iterations,
            "Timing suite started"
        );

        let mut results = Vec::with_capacity(workloads.len());
        for workload in workloads {
            self.observer.on_benchmark_start(&workload.id);
            let span = info_span!("benchmark", workload = %workload.id);
            let Some(series) = self.collect_timing(workload).instrument(span).await else {
                info!(completed = results.len(), "Suite cancelled");
                return results;
            };
            results.push(
                self.aggregator
                    .process_benchmark_results(&workload.id, &series),
            );
            self.observer.on_benchmark_done(&workload.id);
        }

        info!(completed = results.len(), "Timing suite finished");
        results
    }

    /// Run scaling workloads
    pub async fn run_scaling(&self, workloads: &[Workload]) -> Vec<ScalingResult> {
        self.observer.on_suite_start(self.total_runs(workloads));
        info!(
            workloads = workloads.len(),
            interpreters = self.interpreters.len(),
            iterations = self.options.iterations,
            "Scaling suite started"
        );

        let mut results = Vec::with_capacity(workloads.len());
        for workload in workloads {
            self.observer.on_benchmark_start(&workload.id);
            let span = info_span!("scaling", workload = %workload.id);
            let Some(series) = self.collect_scaling(workload).instrument(span).await else {
                info!(completed = results.len(), "Suite cancelled");
                return results;
            };
            results.push(self.aggregator.process_scaling_results(&workload.id, &series));
            self.observer.on_benchmark_done(&workload.id);
        }

        info!(completed = results.len(), "Scaling suite finished");
        results
    }

    fn total_runs(&self, workloads: &[Workload]) -> usize {
        workloads.len() * self.interpreters.len() * self.options.iterations
    }

    /// `None` when the suite was cancelled before the workload completed
    async fn collect_timing(&self, workload: &Workload) -> Option<VersionMap<IterationSeries>> {
        let mut all = VersionMap::new();
        for interpreter in &self.interpreters {
            let mut series = IterationSeries::default();
            for iteration in 1..=self.options.iterations {
                if self.shutdown.is_shutdown() {
                    return None;
                }
                let success = match self.run_once(workload, interpreter, iteration).await {
                    Ok(outcome) => {
                        let duration = self.timing_sample(&workload.id, &outcome);
                        series.record_success(duration, resource_sample(&outcome));
                        true
                    }
                    Err(error) => {
                        series.record_failure(error);
                        false
                    }
                };
                self.observer.on_iteration(
                    &workload.id,
                    &interpreter.version,
                    iteration,
                    self.options.iterations,
                    success,
                );
            }
            all.insert(interpreter.version.clone(), series);
        }
        Some(all)
    }

    async fn collect_scaling(&self, workload: &Workload) -> Option<VersionMap<ScalingSeries>> {
        let mut all = VersionMap::new();
        for interpreter in &self.interpreters {
            let mut series = ScalingSeries::default();
            for iteration in 1..=self.options.iterations {
                if self.shutdown.is_shutdown() {
                    return None;
                }
                let parsed = self
                    .run_once(workload, interpreter, iteration)
                    .await
                    .and_then(|outcome| {
                        ScalingOutput::parse(&outcome.stdout).map_err(|e| e.to_string())
                    });
                let success = match parsed {
                    Ok(output) => {
                        if output.points.is_empty() {
                            warn!(
                                version = %interpreter.version,
                                iteration,
                                "Scaling output has no usable worker counts"
                            );
                        }
                        series.record_success(output);
                        true
                    }
                    Err(error) => {
                        warn!(version = %interpreter.version, iteration, error = %error, "Scaling run unusable");
                        series.record_failure(error);
                        false
                    }
                };
                self.observer.on_iteration(
                    &workload.id,
                    &interpreter.version,
                    iteration,
                    self.options.iterations,
                    success,
                );
            }
            all.insert(interpreter.version.clone(), series);
        }
        Some(all)
    }

    /// One run; a successful exit or a failure description
    async fn run_once(
        &self,
        workload: &Workload,
        interpreter: &Interpreter,
        iteration: usize,
    ) -> std::result::Result<RunOutcome, String> {
        let request = RunRequest {
            env: self.options.env.clone(),
            timeout: self.options.timeout,
            preload: self.options.preload.clone(),
            collect_resources: self.options.profile_level == ProfileLevel::Detailed,
            ..RunRequest::new(interpreter.clone(), workload.path.clone())
        };

        match self.runner.run(&request).await {
            Ok(outcome) if outcome.is_success() => {
                debug!(
                    version = %interpreter.version,
                    iteration,
                    wall_secs = outcome.wall_time.as_secs_f64(),
                    "Run finished"
                );
                Ok(outcome)
            }
            Ok(outcome) => {
                let summary = outcome.failure_summary();
                warn!(version = %interpreter.version, iteration, error = %summary, "Run failed");
                Err(summary)
            }
            Err(e) => {
                warn!(version = %interpreter.version, iteration, error = %e, "Run error");
                Err(e.to_string())
            }
        }
    }

    fn timing_sample(&self, workload: &WorkloadId, outcome: &RunOutcome) -> f64 {
        let wall = outcome.wall_time.as_secs_f64();
        match self.options.timing_source {
            TimingSource::Wall => wall,
            TimingSource::Reported => parse_reported_duration(&outcome.stdout).unwrap_or_else(|| {
                debug!(workload = %workload, "No reported duration, using wall time");
                wall
            }),
        }
    }
}

fn resource_sample(outcome: &RunOutcome) -> Option<ResourceSample> {
    outcome.resources.map(|usage| ResourceSample {
        user_cpu_secs: usage.user_cpu.as_secs_f64(),
        system_cpu_secs: usage.system_cpu.as_secs_f64(),
        wall_secs: outcome.wall_time.as_secs_f64(),
    })
}

/// Duration a workload printed itself (`Duration: 1.2345`), last one wins
pub fn parse_reported_duration(stdout: &str) -> Option<f64> {
    stdout.lines().rev().find_map(|line| {
        let value = line.trim().strip_prefix(REPORTED_DURATION_PREFIX)?.trim();
        let value = value
            .strip_suffix("seconds")
            .or_else(|| value.strip_suffix('s'))
            .unwrap_or(value)
            .trim();
        value
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::{ComparisonStatus, WorkloadKind, DEFAULT_SERIES};
    use crate::port::workload_runner::mocks::{MockRun, MockWorkloadRunner};
    use std::sync::Mutex;

    fn v(label: &str) -> InterpreterVersion {
        InterpreterVersion::parse(label).unwrap()
    }

    fn interpreters(labels: &[&str]) -> Vec<Interpreter> {
        labels
            .iter()
            .map(|l| Interpreter::new(v(l), format!("/usr/bin/python{l}")))
            .collect()
    }

    fn workloads(kind: WorkloadKind, ids: &[&str]) -> Vec<Workload> {
        ids.iter()
            .map(|id| Workload::new(WorkloadId::new(*id).unwrap(), kind, format!("{id}.py")))
            .collect()
    }

    fn suite(runner: Arc<MockWorkloadRunner>, options: SuiteOptions) -> BenchmarkSuite {
        BenchmarkSuite::new(
            interpreters(&["3.12.7", "3.13.0t"]),
            v("3.12.7"),
            ComparisonThreshold::default(),
            options,
            runner,
        )
        .unwrap()
    }

    fn options(iterations: usize) -> SuiteOptions {
        SuiteOptions {
            iterations,
            ..SuiteOptions::default()
        }
    }

    #[test]
    fn test_new_validates() {
        let runner = Arc::new(MockWorkloadRunner::new());
        let missing_baseline = BenchmarkSuite::new(
            interpreters(&["3.13.0"]),
            v("3.12.7"),
            ComparisonThreshold::default(),
            options(1),
            runner.clone(),
        );
        assert!(matches!(
            missing_baseline,
            Err(AppError::Domain(DomainError::MissingBaseline(_)))
        ));

        let zero = BenchmarkSuite::new(
            interpreters(&["3.12.7"]),
            v("3.12.7"),
            ComparisonThreshold::default(),
            options(0),
            runner.clone(),
        );
        assert!(zero.is_err());

        let duplicate = BenchmarkSuite::new(
            interpreters(&["3.12.7", "3.12.7"]),
            v("3.12.7"),
            ComparisonThreshold::default(),
            options(1),
            runner,
        );
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_run_timing_compares_builds() {
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::secs(1.0)])
                .with_runs("3.13.0t", [MockRun::secs(1.5)]),
        );
        let suite = suite(runner.clone(), options(3));

        let results = suite
            .run_timing(&workloads(WorkloadKind::Timing, &["cpu/recursive/test_fibonacci"]))
            .await;

        assert_eq!(runner.call_count(), 6);
        assert_eq!(results.len(), 1);
        let ft = results[0].versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.status, ComparisonStatus::Degraded);
        assert_eq!(ft.relative_display().as_deref(), Some("150.00%"));
        assert_eq!(ft.statistics.as_ref().unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_failures_and_errors_are_counted() {
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::secs(1.0)])
                .with_runs(
                    "3.13.0t",
                    [
                        MockRun::secs(0.5),
                        MockRun::Timeout,
                        MockRun::fail("Traceback\nMemoryError"),
                    ],
                ),
        );
        let suite = suite(runner, options(3));
        let results = suite
            .run_timing(&workloads(WorkloadKind::Timing, &["test_startup"]))
            .await;

        let ft = results[0].versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.failures, 2);
        assert_eq!(ft.error.as_deref(), Some("exit code 1: MemoryError"));
        assert_eq!(ft.status, ComparisonStatus::Improved);
    }

    #[tokio::test]
    async fn test_reported_timing_source() {
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::stdout(1.0, "warming up\nDuration: 0.2500\n")])
                .with_runs("3.13.0t", [MockRun::stdout(1.0, "no timing line")]),
        );
        let suite = suite(
            runner,
            SuiteOptions {
                timing_source: TimingSource::Reported,
                ..options(1)
            },
        );
        let results = suite
            .run_timing(&workloads(WorkloadKind::Timing, &["test_startup"]))
            .await;

        let base = results[0].versions.get(&v("3.12.7")).unwrap();
        assert_eq!(base.duration, Some(0.25));
        // Falls back to wall time
        let ft = results[0].versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.duration, Some(1.0));
    }

    #[tokio::test]
    async fn test_detailed_profile_collects_resources() {
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::secs(2.0)])
                .with_runs("3.13.0t", [MockRun::secs(2.0)]),
        );
        let suite = suite(
            runner.clone(),
            SuiteOptions {
                profile_level: ProfileLevel::Detailed,
                env: HashMap::from([("BENCHMARK_CPU_CORES".to_string(), "4".to_string())]),
                ..options(2)
            },
        );
        let results = suite
            .run_timing(&workloads(WorkloadKind::Timing, &["test_startup"]))
            .await;

        let profiling = results[0]
            .versions
            .get(&v("3.12.7"))
            .unwrap()
            .profiling
            .clone()
            .unwrap();
        assert_eq!(profiling.samples, 2);
        assert!((profiling.cpu_utilization - 1.6).abs() < 1e-9);

        let call = &runner.calls()[0];
        assert!(call.collect_resources);
        assert_eq!(call.env.get("BENCHMARK_CPU_CORES").map(String::as_str), Some("4"));
    }

    #[tokio::test]
    async fn test_run_scaling_parses_outputs() {
        let doc = r#"{"baseline": {"duration": 1.0},
            "scaling_tests": [{"threads": 2, "duration": 0.5}, {"threads": 4, "duration": 0.25}]}"#;
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::stdout(1.0, doc)])
                .with_runs("3.13.0t", [MockRun::stdout(1.0, "Traceback: no json")]),
        );
        let suite = suite(runner, options(2));
        let results = suite
            .run_scaling(&workloads(WorkloadKind::Scaling, &["test_thread_scaling"]))
            .await;

        let base = results[0].versions.get(&v("3.12.7")).unwrap();
        assert_eq!(base.status, ComparisonStatus::Baseline);
        assert_eq!(base.point(DEFAULT_SERIES, 4).unwrap().speedup, 4.0);

        let ft = results[0].versions.get(&v("3.13.0t")).unwrap();
        assert_eq!(ft.status, ComparisonStatus::Failed);
        assert_eq!(ft.failures, 2);
        assert!(ft.error.as_deref().unwrap().contains("Malformed scaling output"));
    }

    /// Triggers shutdown once the given number of runs has been observed
    struct StopAfter {
        runs: Mutex<usize>,
        limit: usize,
        sender: crate::application::shutdown::ShutdownSender,
    }

    impl ProgressObserver for StopAfter {
        fn on_iteration(
            &self,
            _workload: &WorkloadId,
            _version: &InterpreterVersion,
            _iteration: usize,
            _iterations: usize,
            _success: bool,
        ) {
            let mut runs = self.runs.lock().unwrap();
            *runs += 1;
            if *runs == self.limit {
                self.sender.shutdown();
            }
        }
    }

    #[tokio::test]
    async fn test_cancelled_suite_keeps_completed_workloads() {
        let runner = Arc::new(
            MockWorkloadRunner::new()
                .with_runs("3.12.7", [MockRun::secs(1.0)])
                .with_runs("3.13.0t", [MockRun::secs(1.0)]),
        );
        let (sender, token) = shutdown_channel();
        let observer = Arc::new(StopAfter {
            runs: Mutex::new(0),
            // first workload takes 4 runs, stop inside the second
            limit: 5,
            sender,
        });
        let suite = suite(runner.clone(), options(2))
            .with_observer(observer)
            .with_shutdown(token);

        let results = suite
            .run_timing(&workloads(
                WorkloadKind::Timing,
                &["test_a", "test_b", "test_c"],
            ))
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].workload.as_str(), "test_a");
        assert_eq!(runner.call_count(), 5);
    }

    #[test]
    fn test_run_config() {
        let runner = Arc::new(MockWorkloadRunner::new());
        let suite = suite(
            runner,
            SuiteOptions {
                timeout: Some(Duration::from_secs(30)),
                ..options(4)
            },
        );
        let config = suite.run_config(vec!["fibonacci".into()]);
        assert_eq!(config.iterations, 4);
        assert_eq!(config.baseline, v("3.12.7"));
        assert_eq!(config.interpreters, vec![v("3.12.7"), v("3.13.0t")]);
        assert_eq!(config.threshold_percent, 10.0);
        assert_eq!(config.timeout_secs, Some(30.0));
    }

    #[test]
    fn test_parse_reported_duration() {
        assert_eq!(parse_reported_duration("Duration: 1.2345"), Some(1.2345));
        assert_eq!(parse_reported_duration("x\nDuration: 2.5s\n"), Some(2.5));
        assert_eq!(
            parse_reported_duration("Duration: 1.0\nDuration: 3.0 seconds"),
            Some(3.0)
        );
        assert_eq!(parse_reported_duration("Mean Duration: 1.0"), None);
        assert_eq!(parse_reported_duration("Duration: fast"), None);
        assert_eq!(parse_reported_duration(""), None);
    }
}
