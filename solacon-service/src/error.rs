use service_core::error::AppError;
use std::path::PathBuf;
use thiserror::Error;

/// Every way an icon request can end without a file to send back.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator executable not found at {0}")]
    GeneratorMissing(PathBuf),

    #[error("rejected query parameters: {}", .0.join(", "))]
    InvalidParameters(Vec<&'static str>),

    #[error("failed to run generator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("generator timed out after {0} seconds")]
    TimedOut(u64),

    #[error("generator produced no output")]
    EmptyOutput,

    #[error("malformed generator output: {0}")]
    MalformedOutput(#[from] OutputError),
}

/// Ways the two-line `name` / `base64` output can be unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error("missing file name line")]
    MissingName,

    #[error("missing content line")]
    MissingContent,

    #[error("file name contains control characters")]
    InvalidFileName,

    #[error("content is not valid base64: {0}")]
    InvalidBase64(String),
}

impl GenerationError {
    /// Label for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::GeneratorMissing(_) => "generator_missing",
            GenerationError::InvalidParameters(_) => "invalid_parameters",
            GenerationError::Spawn(_) => "spawn_failed",
            GenerationError::TimedOut(_) => "timed_out",
            GenerationError::EmptyOutput => "empty_output",
            GenerationError::MalformedOutput(_) => "malformed_output",
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidParameters(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            GenerationError::GeneratorMissing(_) => AppError::ServiceUnavailable,
            other => AppError::BadGateway(other.to_string()),
        }
    }
}
