//! Download commands.
//!
//! Both commands plan jobs over a time range and hand them to the
//! orchestrator. Rerunning `transactions` with the same arguments resumes
//! every unfinished window from its output file. Snapshot jobs have no
//! checkpoint, so `balances` refuses to write into a file that already holds
//! snapshots unless told to append.

use crate::display::{job_progress_bar, print_report, update_progress};
use crate::{ApiArgs, RangeArgs};
use anyhow::{Context, Result, bail};
use mirrorpull_lib::{
    CheckpointedSink, ClientConfig, FetchClient, JobRecord, JobStatus, Orchestrator, RunConfig,
    RunReport, ensure_dir, snapshot_file_name, snapshot_jobs, window_jobs,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Downloads a paginated resource, one file per window.
pub(crate) async fn transactions(
    api: &ApiArgs,
    range: &RangeArgs,
    resource: &str,
    filters: Vec<String>,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let range = range.window_range()?;
    let template = filters
        .into_iter()
        .fold(api.template(resource), |target, filter| target.with_extra(filter));

    let jobs = window_jobs(&template, &range, &api.output_dir());
    info!(resource, windows = jobs.len(), %range, "planned window jobs");
    let rerun_hint = "rerun the same command to resume".to_string();
    run_jobs(api, jobs, format!("{resource} {range}"), rerun_hint, dry_run, quiet).await
}

/// Downloads one snapshot per step into a single shared file.
///
/// Refuses to run against an output file that already holds snapshots
/// unless `append` is set.
pub(crate) async fn balances(
    api: &ApiArgs,
    range: &RangeArgs,
    resource: &str,
    append: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let range = range.window_range()?;
    let output = api
        .output_dir()
        .join(snapshot_file_name(resource, Some(&api.account)));

    let jobs = snapshot_jobs(&api.template(resource), &range, &output);
    info!(resource, snapshots = jobs.len(), output = %output.display(), "planned snapshot jobs");
    if !dry_run {
        check_snapshot_output(&output, append).await?;
    }
    let rerun_hint = format!(
        "snapshot runs do not resume; rerun with a narrower range and --append, \
         or remove {} and rerun the whole range",
        output.display()
    );
    let message = format!("{resource} {}", api.account);
    run_jobs(api, jobs, message, rerun_hint, dry_run, quiet).await
}

/// Fails if `output` already holds snapshots and `append` is not set.
async fn check_snapshot_output(output: &Path, append: bool) -> Result<()> {
    let sink = CheckpointedSink::new(output);
    if !sink.exists() {
        return Ok(());
    }
    let stats = sink
        .stats()
        .await
        .with_context(|| format!("Failed to read {}", output.display()))?;
    if stats.frames == 0 {
        return Ok(());
    }
    if append {
        warn!(
            output = %output.display(),
            existing = stats.records,
            "appending to an existing snapshot file"
        );
        return Ok(());
    }
    bail!(
        "{} already holds {} snapshots; snapshot runs do not resume, so running again \
         would append duplicates. Pass --append to add to it, or remove it first",
        output.display(),
        stats.records
    )
}

async fn run_jobs(
    api: &ApiArgs,
    jobs: Vec<JobRecord>,
    message: String,
    rerun_hint: String,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    if dry_run {
        for job in &jobs {
            println!("{}", serde_json::to_string(job)?);
        }
        return Ok(());
    }

    let output_dir = api.output_dir();
    ensure_dir(&output_dir)?;

    let client = FetchClient::new(ClientConfig {
        concurrency: api.concurrency,
        ..Default::default()
    })
    .context("Failed to create HTTP client")?;
    let orchestrator = Orchestrator::new(
        client,
        RunConfig {
            concurrency: api.concurrency,
            max_retries: api.max_retries,
        },
    )?;

    let progress = job_progress_bar(jobs.len(), quiet, message)?;
    let report = drive(&orchestrator, jobs, &progress).await;
    progress.finish_and_clear();

    if !quiet {
        print_report(&report);
        println!("Output directory: {}", output_dir.display());
    }

    if !report.is_success() {
        let unfinished = report.jobs.len() - report.count(JobStatus::Completed);
        bail!(
            "{unfinished} out of {} jobs did not complete; {rerun_hint}",
            report.jobs.len()
        );
    }
    Ok(())
}

/// Runs the jobs while refreshing the progress bar from the run counters.
async fn drive(
    orchestrator: &Orchestrator,
    jobs: Vec<JobRecord>,
    progress: &indicatif::ProgressBar,
) -> RunReport {
    let counters = orchestrator.progress().clone();
    let run = orchestrator.run(jobs);
    tokio::pin!(run);

    let mut ticker = tokio::time::interval(Duration::from_millis(200));
    loop {
        tokio::select! {
            report = &mut run => return report,
            _ = ticker.tick() => update_progress(progress, &counters.snapshot()),
        }
    }
}
