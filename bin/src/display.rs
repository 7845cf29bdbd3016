//! Progress and summary output for the mirrorpull CLI.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use mirrorpull_lib::{JobStatus, ProgressSnapshot, RunReport};

/// Creates the run progress bar, hidden in quiet mode.
pub(crate) fn job_progress_bar(total: usize, quiet: bool, message: String) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} jobs ({percent}%) {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message(message);
    Ok(pb)
}

/// Refreshes the bar from the run counters.
pub(crate) fn update_progress(pb: &ProgressBar, snapshot: &ProgressSnapshot) {
    pb.set_position(snapshot.finished() as u64);
    pb.set_message(format!(
        "{} running, {} pages, {} records",
        snapshot.running, snapshot.pages, snapshot.records
    ));
}

/// One-line summary of a finished run.
pub(crate) fn summary_line(report: &RunReport) -> String {
    let mut line = format!(
        "{} jobs: {} completed",
        report.jobs.len(),
        report.count(JobStatus::Completed)
    );
    let incomplete = report.count(JobStatus::Incomplete);
    if incomplete > 0 {
        line.push_str(&format!(", {incomplete} incomplete"));
    }
    let failed = report.count(JobStatus::Failed);
    if failed > 0 {
        line.push_str(&format!(", {failed} failed"));
    }
    line.push_str(&format!(
        "; {} pages, {} records in {:.1}s",
        report.total_pages(),
        report.total_records(),
        report.elapsed.as_secs_f64()
    ));
    line
}

/// Prints the summary and every job that did not complete.
pub(crate) fn print_report(report: &RunReport) {
    println!("{}", summary_line(report));
    for job in report.jobs.iter().filter(|j| j.status != JobStatus::Completed) {
        match &job.error {
            Some(error) => println!("  {} [{}]: {}", job.label, job.status, error),
            None => println!("  {} [{}]", job.label, job.status),
        }
    }
}
