// Filesystem workload catalog
// Timing workloads live under fixed category directories, scaling workloads flat
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use pybench_core::application::constants::TIMING_CATEGORIES;
use pybench_core::domain::workload::WORKLOAD_PREFIX;
use pybench_core::domain::{Workload, WorkloadId, WorkloadKind};
use pybench_core::error::Result;
use pybench_core::port::WorkloadCatalog;

pub struct FsWorkloadCatalog {
    benchmark_dir: PathBuf,
    scaling_dir: PathBuf,
}

impl FsWorkloadCatalog {
    pub fn new(benchmark_dir: impl Into<PathBuf>, scaling_dir: impl Into<PathBuf>) -> Self {
        Self {
            benchmark_dir: benchmark_dir.into(),
            scaling_dir: scaling_dir.into(),
        }
    }

    fn timing_workloads(&self) -> Result<Vec<Workload>> {
        let mut workloads = Vec::new();
        for category in TIMING_CATEGORIES {
            let dir = category
                .split('/')
                .fold(self.benchmark_dir.clone(), |path, part| path.join(part));
            if !dir.is_dir() {
                debug!(category, "Category directory missing, skipped");
                continue;
            }
            for (name, path) in workload_files(&dir)? {
                workloads.push(workload(
                    format!("{category}/{name}"),
                    WorkloadKind::Timing,
                    path,
                ));
            }
        }
        for (name, path) in workload_files(&self.benchmark_dir)? {
            workloads.push(workload(name, WorkloadKind::Timing, path));
        }
        Ok(workloads.into_iter().flatten().collect())
    }

    fn scaling_workloads(&self) -> Result<Vec<Workload>> {
        Ok(workload_files(&self.scaling_dir)?
            .into_iter()
            .filter_map(|(name, path)| workload(name, WorkloadKind::Scaling, path))
            .collect())
    }
}

fn workload(id: String, kind: WorkloadKind, path: PathBuf) -> Option<Workload> {
    match WorkloadId::new(id.as_str()) {
        Ok(id) => Some(Workload::new(id, kind, path)),
        Err(e) => {
            warn!(id, error = %e, "Skipping workload file");
            None
        }
    }
}

/// `test_*.py` files directly inside `dir`, sorted by name (without extension)
fn workload_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(stem) = name
            .strip_suffix(".py")
            .filter(|stem| stem.starts_with(WORKLOAD_PREFIX))
        {
            files.push((stem.to_string(), path.clone()));
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

impl WorkloadCatalog for FsWorkloadCatalog {
    fn discover(&self, kind: WorkloadKind) -> Result<Vec<Workload>> {
        let workloads = match kind {
            WorkloadKind::Timing => self.timing_workloads()?,
            WorkloadKind::Scaling => self.scaling_workloads()?,
        };
        debug!(kind = %kind, count = workloads.len(), "Workloads discovered");
        Ok(workloads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "print('ok')\n").unwrap();
    }

    #[test]
    fn test_discover_timing_in_category_order() {
        let dir = tempfile::tempdir().unwrap();
        let tests = dir.path().join("tests");
        touch(&tests, "object/dict/test_dict_operations.py");
        touch(&tests, "cpu/recursive/test_fibonacci.py");
        touch(&tests, "cpu/recursive/test_ackermann.py");
        touch(&tests, "cpu/recursive/helper.py");
        touch(&tests, "cpu/recursive/test_notes.txt");
        touch(&tests, "unlisted/test_ignored.py");
        touch(&tests, "test_startup.py");

        let catalog = FsWorkloadCatalog::new(&tests, dir.path().join("scaling"));
        let ids: Vec<String> = catalog
            .discover(WorkloadKind::Timing)
            .unwrap()
            .into_iter()
            .map(|w| w.id.to_string())
            .collect();

        assert_eq!(
            ids,
            vec![
                "cpu/recursive/test_ackermann",
                "cpu/recursive/test_fibonacci",
                "object/dict/test_dict_operations",
                "test_startup",
            ]
        );
    }

    #[test]
    fn test_discover_scaling() {
        let dir = tempfile::tempdir().unwrap();
        let scaling = dir.path().join("scaling");
        touch(&scaling, "test_thread_scaling.py");
        touch(&scaling, "test_lock_contention_scaling.py");

        let catalog = FsWorkloadCatalog::new(dir.path().join("tests"), &scaling);
        let scaling_ids: Vec<String> = catalog
            .discover(WorkloadKind::Scaling)
            .unwrap()
            .into_iter()
            .map(|w| w.id.to_string())
            .collect();
        assert_eq!(
            scaling_ids,
            vec!["test_lock_contention_scaling", "test_thread_scaling"]
        );

        // missing timing root is empty, not an error
        assert!(catalog.discover(WorkloadKind::Timing).unwrap().is_empty());

        let id = WorkloadId::new("test_thread_scaling").unwrap();
        let found = catalog.resolve(WorkloadKind::Scaling, &id).unwrap();
        assert_eq!(found.path, scaling.join("test_thread_scaling.py"));
    }
}
