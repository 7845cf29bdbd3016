//! Job planning and concurrent orchestration for mirrorpull.
//!
//! This crate turns a time range into fetch jobs and runs them:
//!
//! - [`JobRecord`] - One fetch unit and its output file
//! - [`window_jobs`] / [`snapshot_jobs`] - Job planning over a [`WindowRange`](mirrorpull_types::WindowRange)
//! - [`Orchestrator`] - Bounded-concurrency runner with failure isolation
//! - [`RunProgress`] - Lock-free counters for progress display

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mirrorpull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod job;
mod orchestrator;
mod paths;
mod plan;
mod progress;

pub use error::{OrchestratorError, Result};
pub use job::{JobId, JobKind, JobRecord, JobReport, JobStatus};
pub use orchestrator::{Orchestrator, RunConfig, RunReport};
pub use paths::{default_data_dir, ensure_dir};
pub use plan::{
    OUTPUT_EXTENSION, snapshot_file_name, snapshot_jobs, window_file_name, window_jobs,
};
pub use progress::{ProgressSnapshot, RunProgress};
