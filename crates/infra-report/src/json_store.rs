// JSON run store
// One pretty-printed document per run under `<root>/runs/<run_id>.json`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use pybench_core::domain::{RunReport, RunSummary};
use pybench_core::error::{AppError, Result};
use pybench_core::port::RunStore;

const RUNS_DIR: &str = "runs";

pub struct JsonRunStore {
    root: PathBuf,
}

impl JsonRunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.root.join(RUNS_DIR)
    }

    pub fn json_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(format!("{run_id}.json"))
    }

    /// Where the HTML page of a run goes (linked from the index)
    pub fn html_path(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(format!("{run_id}.html"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.html")
    }
}

#[async_trait]
impl RunStore for JsonRunStore {
    async fn save(&self, report: &RunReport) -> Result<PathBuf> {
        if report.run_id.is_empty() || report.run_id.contains(['/', '\\']) || report.run_id.starts_with('.') {
            return Err(AppError::Validation(format!(
                "invalid run id {:?}",
                report.run_id
            )));
        }
        tokio::fs::create_dir_all(self.runs_dir()).await?;

        let path = self.json_path(&report.run_id);
        let json = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&path, json).await?;

        info!(run_id = %report.run_id, path = %path.display(), "Run saved");
        Ok(path)
    }

    async fn load(&self, path: &Path) -> Result<RunReport> {
        let data = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("run document {}", path.display())))
            }
            Err(e) => return Err(e.into()),
        };
        let report = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "Run loaded");
        Ok(report)
    }

    async fn list(&self) -> Result<Vec<RunSummary>> {
        let dir = self.runs_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.load(&path).await {
                Ok(report) => runs.push(report.summary()),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable run"),
            }
        }

        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(runs)
    }
}
