//! Append-only gzip JSONL storage for mirrorpull.
//!
//! Every persisted page is one JSON object on one line. Each append writes a
//! self-contained gzip member, so the file is a valid multi-member gzip stream
//! that `zcat` reads as plain JSONL, and an interrupted append can never be
//! mistaken for a complete record.
//!
//! - [`CheckpointedSink`] - One output file plus the lock serializing its writers
//! - [`SinkRegistry`] - Hands out one shared sink per path
//! - [`SinkStats`] - Frame and record counts for inspection

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mirrorpull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod frame;
mod registry;
mod sink;

pub use error::SinkError;
pub use registry::SinkRegistry;
pub use sink::{CheckpointedSink, SinkStats};
