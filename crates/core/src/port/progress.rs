// Progress Observer Port
// Callbacks the suite emits while running; the CLI renders them

use crate::domain::{InterpreterVersion, WorkloadId};

pub trait ProgressObserver: Send + Sync {
    fn on_suite_start(&self, _total_runs: usize) {}

    fn on_benchmark_start(&self, _workload: &WorkloadId) {}

    /// Called after every run (`iteration` is 1-based)
    fn on_iteration(
        &self,
        _workload: &WorkloadId,
        _version: &InterpreterVersion,
        _iteration: usize,
        _iterations: usize,
        _success: bool,
    ) {
    }

    fn on_benchmark_done(&self, _workload: &WorkloadId) {}
}

/// Observer that ignores every event
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}
