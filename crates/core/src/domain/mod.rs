// Domain Layer - Pure measurement model and statistics

pub mod comparison;
pub mod error;
pub mod report;
pub mod result;
pub mod scaling;
pub mod stats;
pub mod system;
pub mod version;
pub mod workload;

// Re-exports
pub use comparison::{
    format_relative, parse_relative, relative_percent, ComparisonStatus, ComparisonThreshold,
};
pub use error::DomainError;
pub use report::{
    BenchmarkEntry, ProfileLevel, RunConfig, RunReport, RunSummary, TimingSource, VersionSummary,
};
pub use result::{BenchmarkResult, ProfilingData, VersionMap, VersionResult};
pub use scaling::{
    ScalingOutput, ScalingPoint, ScalingPointResult, ScalingResult, ScalingVersionResult,
    DEFAULT_SERIES,
};
pub use stats::StatisticalSummary;
pub use system::{CpuFrequency, GitInfo, SystemInfo};
pub use version::InterpreterVersion;
pub use workload::{Workload, WorkloadId, WorkloadKind};
