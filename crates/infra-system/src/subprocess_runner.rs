// Subprocess workload runner
// reason: tokio::process for async child management, nix getrusage for child CPU time
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use pybench_core::application::constants::DEFAULT_ENV_ALLOWLIST;
use pybench_core::port::{
    ResourceUsage, RunError, RunOutcome, RunRequest, RunStatus, WorkloadRunner,
};

/// Runs each workload as a child interpreter process
///
/// The child sees only allowlisted variables of the parent environment plus
/// the variables of the request.
pub struct SubprocessRunner {
    env_allowlist: Vec<String>,
}

impl SubprocessRunner {
    pub fn new(env_allowlist: Vec<String>) -> Self {
        Self { env_allowlist }
    }

    /// Filter environment variables to allowlist only
    fn filter_env(&self, env: impl Iterator<Item = (String, String)>) -> HashMap<String, String> {
        env.filter(|(k, _)| self.env_allowlist.contains(k)).collect()
    }

    fn child_env(&self, request: &RunRequest) -> HashMap<String, String> {
        let mut env = self.filter_env(std::env::vars());
        env.extend(request.env.clone());
        env
    }

    /// Interpreter arguments: the script, or `-c` with preload followed by the script
    fn build_args(request: &RunRequest) -> Vec<String> {
        let script = request.script.to_string_lossy().to_string();
        let mut args = match &request.preload {
            Some(preload) => vec!["-c".to_string(), preload_source(preload, &script)],
            None => vec![script],
        };
        args.extend(request.args.iter().cloned());
        args
    }

    async fn spawn_and_wait(
        &self,
        request: &RunRequest,
    ) -> Result<std::process::Output, RunError> {
        let mut command = Command::new(&request.interpreter.path);
        command
            .args(Self::build_args(request))
            .env_clear()
            .envs(self.child_env(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| RunError::SpawnFailed(format!("{}: {e}", request.interpreter.path.display())))?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(|out| tokio::spawn(read_all(out)));
        let stderr = child.stderr.take().map(|err| tokio::spawn(read_all(err)));

        let status = match request.timeout {
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    // Kill and reap before returning: an unreaped child would be
                    // charged to the next run's RUSAGE_CHILDREN delta
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to kill timed out workload");
                    }
                    for reader in [stdout, stderr].into_iter().flatten() {
                        reader.abort();
                    }
                    return Err(RunError::Timeout(limit));
                }
            },
            None => child.wait().await,
        }
        .map_err(|e| RunError::Io(e.to_string()))?;

        Ok(std::process::Output {
            status,
            stdout: collect(stdout).await?,
            stderr: collect(stderr).await?,
        })
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

async fn collect(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>, RunError> {
    match reader {
        Some(handle) => handle
            .await
            .map_err(|e| RunError::Io(e.to_string()))?
            .map_err(|e| RunError::Io(e.to_string())),
        None => Ok(Vec::new()),
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect())
    }
}

/// Python source running `preload` and then the script as `__main__`
fn preload_source(preload: &str, script: &str) -> String {
    // JSON string literals are valid Python string literals
    let quoted = serde_json::Value::String(script.to_string()).to_string();
    format!(
        "{preload}\nimport sys as _sys\n_sys.argv[0] = {quoted}\n\
         exec(compile(open({quoted}).read(), {quoted}, 'exec'), {{'__name__': '__main__', '__file__': {quoted}}})\n"
    )
}

#[async_trait]
impl WorkloadRunner for SubprocessRunner {
    async fn run(&self, request: &RunRequest) -> Result<RunOutcome, RunError> {
        info!(
            interpreter = %request.interpreter.path.display(),
            version = %request.interpreter.version,
            script = %request.script.display(),
            timeout = ?request.timeout,
            "Starting workload"
        );

        let before = request.collect_resources.then(children_cpu_time).flatten();
        let start = Instant::now();
        let output = self.spawn_and_wait(request).await?;
        let wall_time = start.elapsed();
        let resources = before.and_then(|before| {
            children_cpu_time().map(|after| ResourceUsage {
                user_cpu: after.user_cpu.saturating_sub(before.user_cpu),
                system_cpu: after.system_cpu.saturating_sub(before.system_cpu),
            })
        });

        let status = if output.status.success() {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };

        debug!(
            script = %request.script.display(),
            wall_secs = wall_time.as_secs_f64(),
            exit_code = ?output.status.code(),
            status = ?status,
            "Workload finished"
        );

        Ok(RunOutcome {
            status,
            wall_time,
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            resources,
        })
    }
}

/// CPU time of all waited-for children so far
#[cfg(unix)]
fn children_cpu_time() -> Option<ResourceUsage> {
    use nix::sys::resource::{getrusage, UsageWho};
    use nix::sys::time::TimeVal;

    fn to_duration(tv: TimeVal) -> Duration {
        let secs = u64::try_from(tv.tv_sec()).unwrap_or(0);
        let micros = u64::try_from(tv.tv_usec()).unwrap_or(0);
        Duration::from_secs(secs) + Duration::from_micros(micros)
    }

    let usage = getrusage(UsageWho::RUSAGE_CHILDREN).ok()?;
    Some(ResourceUsage {
        user_cpu: to_duration(usage.user_time()),
        system_cpu: to_duration(usage.system_time()),
    })
}

#[cfg(not(unix))]
fn children_cpu_time() -> Option<ResourceUsage> {
    None
}

/// True when the path looks like an executable file
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
