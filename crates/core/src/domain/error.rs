// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid interpreter version: {0:?}")]
    InvalidVersion(String),

    #[error("Invalid workload id: {0:?}")]
    InvalidWorkload(String),

    #[error("Malformed scaling output: {0}")]
    MalformedScalingOutput(String),

    #[error("Baseline version {0} is not among the configured interpreters")]
    MissingBaseline(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
