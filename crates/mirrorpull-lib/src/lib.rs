//! Resumable, concurrency-bounded downloader for Hedera mirror node REST data.
//!
//! This is a facade crate that re-exports functionality from the mirrorpull
//! workspace crates for convenient access.
//!
//! # Quick Start
//!
//! ```ignore
//! use mirrorpull_lib::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FetchClient::with_defaults()?;
//!     let template = FetchTarget::new(DEFAULT_BASE_URL, "transactions")
//!         .with_account(DEFAULT_ACCOUNT);
//!
//!     let range = WindowRange::from_dates(
//!         chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
//!         Step::Day1,
//!     )?;
//!
//!     let jobs = window_jobs(&template, &range, std::path::Path::new("data"));
//!     let report = Orchestrator::new(client, RunConfig::default())?.run(jobs).await;
//!     println!("{} records", report.total_records());
//!
//!     Ok(())
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/mirrorpull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use mirrorpull_types::*;

// Re-export the checkpointed sink
pub use mirrorpull_sink::{CheckpointedSink, SinkError, SinkRegistry, SinkStats};

// Re-export fetch functionality
#[cfg(feature = "fetch")]
pub use mirrorpull_fetch::{
    AttemptError, BackoffPolicy, ClientConfig, CollectEnd, CollectError, CollectOutcome,
    FetchClient, FetchError, collect, collect_once, collect_once_into, url,
};

// Re-export orchestration
#[cfg(feature = "jobs")]
pub use mirrorpull_jobs::{
    JobId, JobKind, JobRecord, JobReport, JobStatus, Orchestrator, OrchestratorError,
    ProgressSnapshot, RunConfig, RunProgress, RunReport, default_data_dir, ensure_dir,
    snapshot_file_name, snapshot_jobs, window_file_name, window_jobs,
};

/// Prelude module for convenient imports.
///
/// ```
/// use mirrorpull_lib::prelude::*;
/// ```
pub mod prelude {
    pub use mirrorpull_types::{
        Checkpoint, Cursor, DEFAULT_ACCOUNT, DEFAULT_BASE_URL, FetchTarget, Page, SortOrder, Step,
        TimeFilter, WindowRange,
    };

    pub use mirrorpull_sink::{CheckpointedSink, SinkRegistry};

    #[cfg(feature = "fetch")]
    pub use mirrorpull_fetch::{ClientConfig, CollectEnd, FetchClient, collect, collect_once};

    #[cfg(feature = "jobs")]
    pub use mirrorpull_jobs::{
        JobRecord, JobStatus, Orchestrator, RunConfig, RunReport, snapshot_jobs, window_jobs,
    };
}
