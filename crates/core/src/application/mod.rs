// Application Layer - Use Cases

pub mod aggregate;
pub mod constants;
pub mod report;
pub mod scaling;
pub mod selection;
pub mod shutdown;
pub mod suite;

// Re-exports
pub use aggregate::{summarize_resources, IterationSeries, ResourceSample, ResultAggregator};
pub use report::ReportBuilder;
pub use scaling::ScalingSeries;
pub use selection::{normalize_name, select_workloads, Selection};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use suite::{parse_reported_duration, BenchmarkSuite, SuiteOptions};
