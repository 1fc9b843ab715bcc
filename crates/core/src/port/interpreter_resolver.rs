// Interpreter Resolver Port
// Locates and validates the interpreter binary of a configured build

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::InterpreterVersion;
use crate::error::Result;

/// A validated interpreter build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpreter {
    pub version: InterpreterVersion,
    pub path: PathBuf,
}

impl Interpreter {
    pub fn new(version: InterpreterVersion, path: impl Into<PathBuf>) -> Self {
        Self {
            version,
            path: path.into(),
        }
    }
}

#[async_trait]
pub trait InterpreterResolver: Send + Sync {
    /// Resolve a build to an executable and check that it reports the
    /// expected version.
    ///
    /// `explicit_path` skips discovery but is still validated.
    ///
    /// # Errors
    /// - AppError::Interpreter when the build cannot be found or its banner
    ///   does not match the version label
    async fn resolve(
        &self,
        version: &InterpreterVersion,
        explicit_path: Option<PathBuf>,
    ) -> Result<Interpreter>;
}
