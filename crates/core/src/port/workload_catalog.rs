// Workload Catalog Port
// Discovery of workload scripts by kind

use crate::domain::{Workload, WorkloadId, WorkloadKind};
use crate::error::Result;

pub trait WorkloadCatalog: Send + Sync {
    /// All workloads of a kind, in a stable order
    fn discover(&self, kind: WorkloadKind) -> Result<Vec<Workload>>;

    /// Look up one workload by id
    ///
    /// # Errors
    /// - AppError::NotFound if no script backs the id
    fn resolve(&self, kind: WorkloadKind, id: &WorkloadId) -> Result<Workload> {
        self.discover(kind)?
            .into_iter()
            .find(|w| &w.id == id)
            .ok_or_else(|| crate::AppError::NotFound(format!("{kind} workload {id}")))
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Fixed in-memory catalog
    pub struct StaticCatalog {
        workloads: Vec<Workload>,
    }

    impl StaticCatalog {
        pub fn new(workloads: Vec<Workload>) -> Self {
            Self { workloads }
        }

        /// Build a catalog from ids; paths are `<id>.py`, invalid ids are skipped
        pub fn from_ids(kind: WorkloadKind, ids: &[&str]) -> Self {
            let workloads = ids
                .iter()
                .filter_map(|id| WorkloadId::new(*id).ok())
                .map(|id| {
                    let path = format!("{id}.py");
                    Workload::new(id, kind, path)
                })
                .collect();
            Self::new(workloads)
        }
    }

    impl WorkloadCatalog for StaticCatalog {
        fn discover(&self, kind: WorkloadKind) -> Result<Vec<Workload>> {
            Ok(self
                .workloads
                .iter()
                .filter(|w| w.kind == kind)
                .cloned()
                .collect())
        }
    }
}
