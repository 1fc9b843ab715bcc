// Git checkout information
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use pybench_core::domain::GitInfo;

async fn rev_parse(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("rev-parse")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

/// Branch and commit of the checkout at `dir`; `None` without git or outside a repository
pub async fn git_info(dir: &Path) -> Option<GitInfo> {
    let commit = rev_parse(dir, &["HEAD"]).await;
    let branch = rev_parse(dir, &["--abbrev-ref", "HEAD"]).await;
    match (branch, commit) {
        (Some(branch), Some(commit)) => Some(GitInfo { branch, commit }),
        _ => {
            debug!(dir = %dir.display(), "No git information");
            None
        }
    }
}
