//! Core types for the mirrorpull downloader.
//!
//! This crate provides the data structures shared by every other crate in the
//! workspace:
//!
//! - [`FetchTarget`] - Immutable description of one fetch unit
//! - [`Page`] - One parsed API response
//! - [`Cursor`] - Opaque continuation token taken from `links.next`
//! - [`Checkpoint`] - Resume position reconstructed from a persisted page
//! - [`WindowRange`] - Time range split into fixed-size windows
//! - [`Step`] - Window granularity

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mirrorpull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod page;
mod step;
mod target;
mod window;

pub use error::{CheckpointError, WindowError};
pub use page::{Checkpoint, Cursor, Page};
pub use step::{Step, StepParseError};
pub use target::{
    DEFAULT_ACCOUNT, DEFAULT_API_PREFIX, DEFAULT_BASE_URL, DEFAULT_LIMIT, FetchTarget, SortOrder,
    TimeFilter,
};
pub use window::{PointIterator, TimeWindow, WindowIterator, WindowRange};
