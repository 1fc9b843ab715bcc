// Run report assembly
// Stamps results with an id, a timestamp and the host context

use std::sync::Arc;
use tracing::info;

use crate::domain::{BenchmarkResult, RunConfig, RunReport, ScalingResult};
use crate::port::{IdProvider, SystemProbe, TimeProvider};

pub struct ReportBuilder {
    system_probe: Arc<dyn SystemProbe>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl ReportBuilder {
    pub fn new(
        system_probe: Arc<dyn SystemProbe>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            system_probe,
            time_provider,
            id_provider,
        }
    }

    /// Assemble the report of a finished run
    pub async fn build(
        &self,
        run_config: RunConfig,
        benchmarks: &[BenchmarkResult],
        scaling: &[ScalingResult],
    ) -> RunReport {
        let system_info = self.system_probe.system_info().await;
        let git_info = self.system_probe.git_info().await;

        let mut report = RunReport::new(
            self.id_provider.generate_id(),
            self.time_provider.now(),
            system_info,
            git_info,
            run_config,
        );
        report.add_benchmarks(benchmarks);
        report.add_scaling(scaling);

        info!(
            run_id = %report.run_id,
            benchmarks = report.benchmarks.len(),
            scaling = report.scaling.len(),
            "Run report assembled"
        );
        report
    }
}
