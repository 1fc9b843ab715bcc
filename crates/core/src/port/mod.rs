// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod interpreter_resolver;
pub mod progress;
pub mod run_store;
pub mod system_probe;
pub mod time_provider;
pub mod workload_catalog;
pub mod workload_runner;

// Re-exports
pub use id_provider::{FixedIdProvider, IdProvider, UuidProvider};
pub use interpreter_resolver::{Interpreter, InterpreterResolver};
pub use progress::{NoopObserver, ProgressObserver};
pub use run_store::RunStore;
pub use system_probe::SystemProbe;
pub use time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
pub use workload_catalog::WorkloadCatalog;
pub use workload_runner::{
    ResourceUsage, RunError, RunOutcome, RunRequest, RunStatus, WorkloadRunner,
};
