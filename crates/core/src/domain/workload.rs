// Workload Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::error::{DomainError, Result};

/// Prefix every workload file name must carry
pub const WORKLOAD_PREFIX: &str = "test_";

/// Workload identifier: slash-separated path below its root, without `.py`
/// (e.g. `cpu/recursive/test_fibonacci`, or `test_startup` at root level)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkloadId(String);

impl WorkloadId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && !id.ends_with(".py")
            && id
                .split('/')
                .all(|part| !part.is_empty() && part != "." && part != "..");
        if !valid {
            return Err(DomainError::InvalidWorkload(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the id (`None` for root-level workloads)
    pub fn category(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(category, _)| category)
    }

    /// Final path component
    pub fn short_name(&self) -> &str {
        self.0
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for WorkloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WorkloadId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<WorkloadId> for String {
    fn from(value: WorkloadId) -> Self {
        value.0
    }
}

/// How a workload reports its measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Plain script, timed by the harness
    Timing,
    /// Script printing a scaling document (per worker count durations) on stdout
    Scaling,
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadKind::Timing => write!(f, "timing"),
            WorkloadKind::Scaling => write!(f, "scaling"),
        }
    }
}

/// A discovered workload script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub id: WorkloadId,
    pub kind: WorkloadKind,
    pub path: PathBuf,
}

impl Workload {
    pub fn new(id: WorkloadId, kind: WorkloadKind, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            kind,
            path: path.into(),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.id.category()
    }

    pub fn short_name(&self) -> &str {
        self.id.short_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_short_name() {
        let id = WorkloadId::new("cpu/recursive/test_fibonacci").unwrap();
        assert_eq!(id.category(), Some("cpu/recursive"));
        assert_eq!(id.short_name(), "test_fibonacci");

        let root = WorkloadId::new("test_startup").unwrap();
        assert_eq!(root.category(), None);
        assert_eq!(root.short_name(), "test_startup");
    }

    #[test]
    fn test_rejects_invalid_ids() {
        for id in ["", "cpu//test_x", "../test_x", "cpu/test_x.py", "cpu/"] {
            assert!(WorkloadId::new(id).is_err(), "{id:?} should be rejected");
        }
    }
}
