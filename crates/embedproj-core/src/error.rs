//! Projection error types

use thiserror::Error;

/// Errors returned to callers of the projection pipeline.
///
/// Only input validation can fail a call. Failures of the learned reducer are
/// [`ReducerError`]s and never leave the orchestrator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    /// First vector of a batch has a width outside the accepted set
    #[error("unsupported embedding width {width}, expected 384 or 1536")]
    InvalidDimension { width: usize },

    /// Reduction method is unknown or not supported by this pipeline
    #[error("unsupported reduction method '{0}'")]
    UnsupportedMethod(String),

    /// Output dimensionality outside {2, 3}
    #[error("invalid output dimensions {0}, expected 2 or 3")]
    InvalidOutputDimensions(usize),

    /// Reference vectors and coordinates are not parallel arrays
    #[error("reference set mismatch: {vectors} vectors vs {coordinates} coordinates")]
    ReferenceMismatch { vectors: usize, coordinates: usize },
}

/// Failures raised by an external learned reducer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReducerError {
    /// Backend missing (library not installed, feature disabled)
    #[error("reducer unavailable: {0}")]
    Unavailable(String),

    /// Backend ran and failed
    #[error("reducer failed: {0}")]
    Failed(String),

    /// Backend returned rows that do not match the request
    #[error("malformed reducer output: {0}")]
    Malformed(String),
}

/// Result type for projection operations
pub type Result<T> = std::result::Result<T, ProjectionError>;
