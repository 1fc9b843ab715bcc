// Workload Runner Port
// Abstraction for running one workload script under one interpreter build

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::port::interpreter_resolver::Interpreter;

/// One invocation of a workload script
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub interpreter: Interpreter,
    pub script: PathBuf,
    pub args: Vec<String>,
    /// Extra environment for the child (merged over the allowlisted parent env)
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// Python source executed in the same interpreter before the script
    pub preload: Option<String>,
    /// Collect child CPU usage alongside wall time
    pub collect_resources: bool,
}

impl RunRequest {
    pub fn new(interpreter: Interpreter, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter,
            script: script.into(),
            args: Vec::new(),
            env: HashMap::new(),
            working_dir: None,
            timeout: None,
            preload: None,
            collect_resources: false,
        }
    }
}

/// CPU time consumed by the child process
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceUsage {
    pub user_cpu: Duration,
    pub system_cpu: Duration,
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub wall_time: Duration,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub resources: Option<ResourceUsage>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Short failure description for reports (exit code + last stderr line)
    pub fn failure_summary(&self) -> String {
        let last_line = self
            .stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim();
        match self.exit_code {
            Some(code) if last_line.is_empty() => format!("exit code {code}"),
            Some(code) => format!("exit code {code}: {last_line}"),
            None if last_line.is_empty() => "terminated by signal".to_string(),
            None => format!("terminated by signal: {last_line}"),
        }
    }
}

/// Run status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

/// Run errors (the workload never produced an exit status)
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Workload timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(String),
}

/// Workload Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns the interpreter as a child process
#[async_trait]
pub trait WorkloadRunner: Send + Sync {
    /// Run a workload to completion
    ///
    /// # Errors
    /// - RunError::SpawnFailed if the interpreter cannot be started
    /// - RunError::Timeout if the run exceeds `request.timeout`
    async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted behavior of one mock run
    #[derive(Debug, Clone)]
    pub enum MockRun {
        /// Exit 0 after the given wall time with the given stdout
        Success { secs: f64, stdout: String },
        /// Exit non-zero with stderr
        Fail { code: i32, stderr: String },
        /// Never exits within the timeout
        Timeout,
        /// Interpreter cannot be spawned
        SpawnError(String),
    }

    impl MockRun {
        pub fn secs(secs: f64) -> Self {
            MockRun::Success {
                secs,
                stdout: String::new(),
            }
        }

        pub fn stdout(secs: f64, stdout: impl Into<String>) -> Self {
            MockRun::Success {
                secs,
                stdout: stdout.into(),
            }
        }

        pub fn fail(stderr: impl Into<String>) -> Self {
            MockRun::Fail {
                code: 1,
                stderr: stderr.into(),
            }
        }
    }

    /// Mock runner replaying scripted runs per interpreter version
    ///
    /// Runs for a version are consumed in order; once exhausted the last one repeats.
    #[derive(Default)]
    pub struct MockWorkloadRunner {
        scripts: Mutex<HashMap<String, VecDeque<MockRun>>>,
        last: Mutex<HashMap<String, MockRun>>,
        calls: Arc<Mutex<Vec<RunRequest>>>,
    }

    impl MockWorkloadRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue runs for an interpreter version
        pub fn with_runs(self, version: &str, runs: impl IntoIterator<Item = MockRun>) -> Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(version.to_string())
                .or_default()
                .extend(runs);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<RunRequest> {
            self.calls.lock().unwrap().clone()
        }

        fn next_run(&self, version: &str) -> MockRun {
            let next = self
                .scripts
                .lock()
                .unwrap()
                .get_mut(version)
                .and_then(VecDeque::pop_front);
            let mut last = self.last.lock().unwrap();
            match next {
                Some(run) => {
                    last.insert(version.to_string(), run.clone());
                    run
                }
                None => last
                    .get(version)
                    .cloned()
                    .unwrap_or_else(|| MockRun::SpawnError(format!("no mock runs for {version}"))),
            }
        }
    }

    #[async_trait]
    impl WorkloadRunner for MockWorkloadRunner {
        async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunError> {
            self.calls.lock().unwrap().push(request.clone());

            match self.next_run(request.interpreter.version.as_str()) {
                MockRun::Success { secs, stdout } => Ok(RunOutcome {
                    status: RunStatus::Success,
                    wall_time: Duration::from_secs_f64(secs),
                    exit_code: Some(0),
                    stdout,
                    stderr: String::new(),
                    resources: request.collect_resources.then(|| ResourceUsage {
                        user_cpu: Duration::from_secs_f64(secs * 1.5),
                        system_cpu: Duration::from_secs_f64(secs * 0.1),
                    }),
                }),
                MockRun::Fail { code, stderr } => Ok(RunOutcome {
                    status: RunStatus::Failed,
                    wall_time: Duration::from_millis(10),
                    exit_code: Some(code),
                    stdout: String::new(),
                    stderr,
                    resources: None,
                }),
                MockRun::Timeout => Err(RunError::Timeout(
                    request.timeout.unwrap_or(Duration::from_secs(1)),
                )),
                MockRun::SpawnError(msg) => Err(RunError::SpawnFailed(msg)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(exit_code: Option<i32>, stderr: &str) -> RunOutcome {
        RunOutcome {
            status: RunStatus::Failed,
            wall_time: Duration::ZERO,
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            resources: None,
        }
    }

    #[test]
    fn test_failure_summary_uses_last_stderr_line() {
        let o = outcome(
            Some(1),
            "Traceback (most recent call last):\n  ...\nZeroDivisionError: division by zero\n\n",
        );
        assert_eq!(
            o.failure_summary(),
            "exit code 1: ZeroDivisionError: division by zero"
        );
        assert_eq!(outcome(Some(2), "").failure_summary(), "exit code 2");
        assert_eq!(outcome(None, "").failure_summary(), "terminated by signal");
    }
}
