//! Error types for job orchestration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that prevent a run from starting.
///
/// Failures of individual jobs never surface here; they are reported per job
/// in the [`RunReport`](crate::RunReport).
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A concurrency limit of zero would never schedule anything.
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
