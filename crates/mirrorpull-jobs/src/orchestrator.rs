//! Concurrent job execution.

use futures::future::join_all;
use mirrorpull_fetch::{FetchClient, collect, collect_once_into};
use mirrorpull_sink::{CheckpointedSink, SinkRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::{JobKind, JobRecord, JobReport, JobStatus, OrchestratorError, Result, RunProgress};

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of jobs with a request in flight at any moment.
    pub concurrency: usize,
    /// Attempts per request.
    pub max_retries: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_retries: 13,
        }
    }
}

/// Summary of a run, one entry per job in submission order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Per-job results.
    pub jobs: Vec<JobReport>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of jobs with the given status.
    #[must_use]
    pub fn count(&self, status: JobStatus) -> usize {
        self.jobs.iter().filter(|j| j.status == status).count()
    }

    /// Pages appended across all jobs.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.jobs.iter().map(JobReport::pages).sum()
    }

    /// Records appended across all jobs.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.jobs.iter().map(JobReport::records).sum()
    }

    /// Returns true if every job completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.jobs.iter().all(|j| j.status == JobStatus::Completed)
    }
}

/// Runs jobs against a shared client with bounded concurrency.
///
/// Every job holds a semaphore permit for its whole lifetime, including
/// retry sleeps, so at most `concurrency` jobs (and therefore requests) are
/// in flight. Jobs writing to the same file share one sink through the
/// [`SinkRegistry`].
#[derive(Debug)]
pub struct Orchestrator {
    client: FetchClient,
    config: RunConfig,
    sinks: SinkRegistry,
    progress: RunProgress,
}

impl Orchestrator {
    /// Creates an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ZeroConcurrency`] if the limit is zero.
    pub fn new(client: FetchClient, config: RunConfig) -> Result<Self> {
        if config.concurrency == 0 {
            return Err(OrchestratorError::ZeroConcurrency);
        }
        Ok(Self {
            client,
            config,
            sinks: SinkRegistry::new(),
            progress: RunProgress::new(),
        })
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Returns the shared progress tracker.
    #[must_use]
    pub const fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Returns the sink registry.
    #[must_use]
    pub const fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    /// Runs every job to completion.
    ///
    /// A failing or panicking job is recorded in the report and never stops
    /// the others. The report lists jobs in submission order.
    pub async fn run(&self, jobs: Vec<JobRecord>) -> RunReport {
        let started = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        self.progress.add_jobs(jobs.len());
        info!(
            jobs = jobs.len(),
            concurrency = self.config.concurrency,
            max_retries = self.config.max_retries,
            "starting run"
        );

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let sink = self.sinks.get(&job.output);
                let semaphore = Arc::clone(&semaphore);
                let client = self.client.clone();
                let progress = self.progress.clone();
                let max_retries = self.config.max_retries;
                let meta = job.clone();

                let handle = tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return JobReport::failed(&job, "scheduler closed", Duration::ZERO);
                    };
                    let slot = progress.job_started();
                    let report = execute(&client, &job, &sink, max_retries).await;
                    drop(slot);
                    progress.record(&report);
                    report
                });
                (meta, handle)
            })
            .collect();

        let jobs = join_all(handles.into_iter().map(|(meta, handle)| async move {
            match handle.await {
                Ok(report) => report,
                Err(e) => {
                    error!(job = %meta.label(), error = %e, "job task aborted");
                    let report =
                        JobReport::failed(&meta, format!("job task aborted: {e}"), Duration::ZERO);
                    self.progress.record(&report);
                    report
                }
            }
        }))
        .await;

        let report = RunReport {
            jobs,
            elapsed: started.elapsed(),
        };
        info!(
            completed = report.count(JobStatus::Completed),
            incomplete = report.count(JobStatus::Incomplete),
            failed = report.count(JobStatus::Failed),
            pages = report.total_pages(),
            records = report.total_records(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "run finished"
        );
        report
    }
}

async fn execute(
    client: &FetchClient,
    job: &JobRecord,
    sink: &CheckpointedSink,
    max_retries: u32,
) -> JobReport {
    let started = Instant::now();
    debug!(job = %job.label(), id = %job.id, "job started");

    let result = match job.kind {
        JobKind::Paginated => collect(client, &job.target, sink, max_retries).await,
        JobKind::SingleShot => collect_once_into(client, &job.target, sink, max_retries).await,
    };

    match result {
        Ok(outcome) => {
            let report = JobReport::finished(job, outcome, started.elapsed());
            if report.status == JobStatus::Completed {
                info!(
                    job = %report.label,
                    end = %outcome.end,
                    pages = outcome.pages,
                    records = outcome.records,
                    "job finished"
                );
            } else if job.kind == JobKind::Paginated {
                warn!(
                    job = %report.label,
                    end = %outcome.end,
                    pages = outcome.pages,
                    "job stopped early, rerun to resume"
                );
            } else {
                warn!(job = %report.label, end = %outcome.end, "snapshot not fetched");
            }
            report
        }
        Err(e) => {
            error!(job = %job.label(), error = %e, "job failed");
            JobReport::failed(job, e.to_string(), started.elapsed())
        }
    }
}
