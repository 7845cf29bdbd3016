//! Progress tracking for a run.
//!
//! Counters are lock-free so every job task can update them without
//! contending with the others. Readers take a [`ProgressSnapshot`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{JobReport, JobStatus};

#[derive(Debug, Default)]
struct Counters {
    total: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    completed: AtomicUsize,
    incomplete: AtomicUsize,
    failed: AtomicUsize,
    pages: AtomicUsize,
    records: AtomicUsize,
}

/// Thread-safe progress tracker shared by all jobs of a run.
///
/// Cloning is cheap; clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct RunProgress {
    counters: Arc<Counters>,
}

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    /// Jobs submitted.
    pub total: usize,
    /// Jobs currently holding a concurrency slot.
    pub running: usize,
    /// Highest number of jobs that held a slot at the same time.
    pub peak_running: usize,
    /// Jobs that persisted everything.
    pub completed: usize,
    /// Jobs that stopped early.
    pub incomplete: usize,
    /// Jobs that aborted.
    pub failed: usize,
    /// Pages appended so far.
    pub pages: usize,
    /// Records appended so far.
    pub records: usize,
}

impl ProgressSnapshot {
    /// Jobs in a terminal state.
    #[must_use]
    pub const fn finished(&self) -> usize {
        self.completed + self.incomplete + self.failed
    }

    /// Returns the progress percentage over finished jobs.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.finished() as f64 / self.total as f64) * 100.0
    }
}

impl RunProgress {
    /// Creates a tracker with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_jobs(&self, n: usize) {
        self.counters.total.fetch_add(n, Ordering::Relaxed);
    }

    /// Marks a job as running until the returned slot is dropped.
    ///
    /// The slot is released on unwind as well, so a panicking job never
    /// leaves the gauge raised.
    pub(crate) fn job_started(&self) -> RunningSlot {
        let running = self.counters.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak_running.fetch_max(running, Ordering::AcqRel);
        RunningSlot {
            counters: Arc::clone(&self.counters),
        }
    }

    /// Counts a finished job.
    pub(crate) fn record(&self, report: &JobReport) {
        let counter = match report.status {
            JobStatus::Completed => &self.counters.completed,
            JobStatus::Incomplete => &self.counters.incomplete,
            JobStatus::Failed => &self.counters.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.counters.pages.fetch_add(report.pages(), Ordering::Relaxed);
        self.counters
            .records
            .fetch_add(report.records(), Ordering::Relaxed);
    }

    /// Returns a copy of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let c = &self.counters;
        ProgressSnapshot {
            total: c.total.load(Ordering::Relaxed),
            running: c.running.load(Ordering::Acquire),
            peak_running: c.peak_running.load(Ordering::Acquire),
            completed: c.completed.load(Ordering::Relaxed),
            incomplete: c.incomplete.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            pages: c.pages.load(Ordering::Relaxed),
            records: c.records.load(Ordering::Relaxed),
        }
    }
}

/// One unit of the running gauge, held while a job executes.
#[derive(Debug)]
pub(crate) struct RunningSlot {
    counters: Arc<Counters>,
}

impl Drop for RunningSlot {
    fn drop(&mut self) {
        self.counters.running.fetch_sub(1, Ordering::AcqRel);
    }
}
