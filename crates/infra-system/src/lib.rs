// pybench Infrastructure - System Adapters
// Implements: WorkloadRunner, InterpreterResolver, SystemProbe, WorkloadCatalog

pub mod fs_catalog;
pub mod git;
pub mod pyenv_resolver;
pub mod subprocess_runner;
pub mod system_probe_impl;

pub use fs_catalog::FsWorkloadCatalog;
pub use pyenv_resolver::PyenvResolver;
pub use subprocess_runner::SubprocessRunner;
pub use system_probe_impl::SystemProbeImpl;
