use thiserror::Error;

use crate::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),
    #[error("TLE directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("TLE file read error: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Invalid TLE format in {file}: {message}")]
    InvalidTle { file: String, message: String },
}

impl From<GeometryError> for PredictError {
    fn from(err: GeometryError) -> Self {
        PredictError::InvalidInput(err.to_string())
    }
}

/// Failure reported by a position provider for one query.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PropagationError {
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),
    #[error("time outside the propagatable range: {0}")]
    Epoch(String),
    #[error("propagation diverged: {0}")]
    Diverged(String),
}
