//! Sink error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Failed to create the sink's parent directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to append to the sink file.
    #[error("Failed to write sink '{path}': {source}")]
    Write {
        /// The sink file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read the sink file.
    #[error("Failed to read sink '{path}': {source}")]
    Read {
        /// The sink file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to serialize a record.
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to compress a record.
    #[error("Failed to compress record: {0}")]
    Compress(#[source] std::io::Error),

    /// The last complete record does not parse as JSON.
    #[error("Last record of '{path}' is not valid JSON: {source}")]
    CorruptRecord {
        /// The sink file.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A blocking I/O task panicked or was cancelled.
    #[error("Sink I/O task failed: {0}")]
    Task(String),
}
