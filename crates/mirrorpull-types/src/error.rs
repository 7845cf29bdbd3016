//! Error types shared across mirrorpull crates.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error for invalid time window ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// Start is not before end.
    #[error("Invalid time range: {start} >= {end}")]
    InvalidRange {
        /// The start instant.
        start: DateTime<Utc>,
        /// The end instant.
        end: DateTime<Utc>,
    },
}

/// A persisted page that cannot be used as a resume point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    /// The record is not a JSON object.
    #[error("checkpoint record is not a JSON object")]
    NotAnObject,

    /// The `links` field exists but is not an object.
    #[error("checkpoint `links` field is not an object")]
    InvalidLinks,

    /// The `links.next` field is neither a string nor null.
    #[error("checkpoint `links.next` is neither a string nor null")]
    InvalidNext,
}
