// Harness constants (no magic values elsewhere)

/// Iterations per benchmark and interpreter build
pub const DEFAULT_ITERATIONS: usize = 5;

/// Reference build every other build is compared against
pub const DEFAULT_BASELINE: &str = "3.12.7";

/// Builds measured when no configuration names any
pub const DEFAULT_INTERPRETERS: [&str; 3] = ["3.12.7", "3.13.0", "3.13.0t"];

/// Root of timing workloads
pub const DEFAULT_BENCHMARK_DIR: &str = "benchmarks/tests";

/// Root of scaling workloads
pub const DEFAULT_SCALING_DIR: &str = "benchmarks/scaling";

/// Timing workload categories, in report order
pub const TIMING_CATEGORIES: [&str; 12] = [
    "cpu/recursive",
    "cpu/arithmetic",
    "memory/allocation",
    "memory/gc",
    "object/dict",
    "object/list",
    "object/string",
    "interpreter/gil",
    "interpreter/bytecode",
    "interpreter/imports",
    "mixed/mem_cpu",
    "mixed/io_cpu",
];

/// Line prefix timing workloads print their own measurement with
pub const REPORTED_DURATION_PREFIX: &str = "Duration:";

/// Cap on cores workloads may use (`all` or a number)
pub const ENV_CPU_CORES: &str = "BENCHMARK_CPU_CORES";

/// Threads per core workloads may start
pub const ENV_THREAD_LIMIT: &str = "BENCHMARK_THREAD_LIMIT";

/// Explicit CPU list (`0-3` or `0,1,2,3`) used when affinity is unavailable
pub const ENV_CPU_SET: &str = "CPU_SET";

/// Parent environment variables passed through to workloads
pub const DEFAULT_ENV_ALLOWLIST: [&str; 11] = [
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "PYENV_ROOT",
    "PYTHON_GIL",
    ENV_CPU_CORES,
    ENV_THREAD_LIMIT,
    ENV_CPU_SET,
];
