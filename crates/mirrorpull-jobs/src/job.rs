//! Job definitions and results.

use mirrorpull_fetch::{CollectEnd, CollectOutcome};
use mirrorpull_types::FetchTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a job.
pub type JobId = Uuid;

/// How a job talks to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Follow the continuation chain, resuming from the output file.
    Paginated,
    /// One request, appended to a possibly shared output file.
    SingleShot,
}

impl JobKind {
    /// Returns the kind as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paginated => "paginated",
            Self::SingleShot => "single-shot",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of work: what to fetch and where to write it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier.
    pub id: JobId,
    /// Pagination mode.
    pub kind: JobKind,
    /// The request template.
    pub target: FetchTarget,
    /// Output file. Several single-shot jobs may share one.
    pub output: PathBuf,
}

impl JobRecord {
    /// Creates a paginated job.
    #[must_use]
    pub fn paginated(target: FetchTarget, output: impl Into<PathBuf>) -> Self {
        Self::new(JobKind::Paginated, target, output)
    }

    /// Creates a single-shot job.
    #[must_use]
    pub fn single_shot(target: FetchTarget, output: impl Into<PathBuf>) -> Self {
        Self::new(JobKind::SingleShot, target, output)
    }

    fn new(kind: JobKind, target: FetchTarget, output: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            target,
            output: output.into(),
        }
    }

    /// Returns a short human-readable label for logs.
    #[must_use]
    pub fn label(&self) -> String {
        let file = self
            .output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{} {} -> {}", self.kind, self.target.resource, file)
    }
}

/// Final status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Everything the API had was persisted.
    Completed,
    /// The job stopped early (retries exhausted or a cursor loop) and can be
    /// resumed by running it again.
    Incomplete,
    /// The job aborted with an error.
    Failed,
}

impl JobStatus {
    /// Returns the status as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Failed => "failed",
        }
    }

    /// Maps how a collection ended onto a job status.
    ///
    /// An empty response means the API has nothing at that position, which
    /// is a normal end.
    #[must_use]
    pub const fn from_end(end: CollectEnd) -> Self {
        match end {
            CollectEnd::Completed | CollectEnd::AlreadyComplete | CollectEnd::Empty => {
                Self::Completed
            }
            CollectEnd::Exhausted | CollectEnd::Stalled => Self::Incomplete,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of one job within a run.
#[derive(Debug, Clone)]
pub struct JobReport {
    /// The job identifier.
    pub id: JobId,
    /// The job kind.
    pub kind: JobKind,
    /// The job label.
    pub label: String,
    /// The output file.
    pub output: PathBuf,
    /// Final status.
    pub status: JobStatus,
    /// Collection summary, absent when the job failed.
    pub outcome: Option<CollectOutcome>,
    /// Error message if the job failed.
    pub error: Option<String>,
    /// Wall time spent on the job, including waiting for retries.
    pub elapsed: Duration,
}

impl JobReport {
    pub(crate) fn finished(job: &JobRecord, outcome: CollectOutcome, elapsed: Duration) -> Self {
        Self::new(job, JobStatus::from_end(outcome.end), Some(outcome), None, elapsed)
    }

    pub(crate) fn failed(job: &JobRecord, error: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(job, JobStatus::Failed, None, Some(error.into()), elapsed)
    }

    fn new(
        job: &JobRecord,
        status: JobStatus,
        outcome: Option<CollectOutcome>,
        error: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            id: job.id,
            kind: job.kind,
            label: job.label(),
            output: job.output.clone(),
            status,
            outcome,
            error,
            elapsed,
        }
    }

    /// Pages appended by this job.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.outcome.map_or(0, |o| o.pages)
    }

    /// Records appended by this job.
    #[must_use]
    pub fn records(&self) -> usize {
        self.outcome.map_or(0, |o| o.records)
    }
}
