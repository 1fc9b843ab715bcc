// Run Store Port
// Persistence of run reports (one document per run) and the run history

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::{RunReport, RunSummary};
use crate::error::Result;

#[async_trait]
pub trait RunStore: Send + Sync {
    /// Persist a run, returning where it was written
    async fn save(&self, report: &RunReport) -> Result<PathBuf>;

    /// Load a run document
    ///
    /// # Errors
    /// - AppError::NotFound if the document does not exist
    /// - AppError::Serialization if it is not a run report
    async fn load(&self, path: &Path) -> Result<RunReport>;

    /// All stored runs, newest first
    async fn list(&self) -> Result<Vec<RunSummary>>;
}
