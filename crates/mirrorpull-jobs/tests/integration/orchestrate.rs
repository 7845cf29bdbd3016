use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use mirrorpull_fetch::url;
use mirrorpull_jobs::{
    JobRecord, JobStatus, Orchestrator, RunConfig, snapshot_file_name, snapshot_jobs, window_jobs,
};
use mirrorpull_sink::CheckpointedSink;
use mirrorpull_types::{FetchTarget, Step, WindowRange};
use serde_json::json;
use tempfile::TempDir;

use crate::support::helpers::{fast_client, init_tracing};
use crate::support::mock_api::{MockMirror, MockMirrorServer};

fn range(days: u32, step: Step) -> WindowRange {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let end = NaiveDate::from_ymd_opt(2024, 1, 1 + days).expect("valid date");
    WindowRange::from_dates(start, end, step).expect("valid range")
}

fn orchestrator(concurrency: usize, max_retries: u32) -> Orchestrator {
    Orchestrator::new(
        fast_client(),
        RunConfig {
            concurrency,
            max_retries,
        },
    )
    .expect("valid config")
}

#[tokio::test]
async fn window_jobs_write_one_file_each() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let tmp = TempDir::new()?;

    let template = FetchTarget::new(server.url(), "transactions").with_account("0.0.800");
    let jobs = window_jobs(&template, &range(3, Step::Day1), tmp.path());
    let mut expected = Vec::new();
    for job in &jobs {
        expected.push(mirror.serve_chain("transactions", &url::initial_query(&job.target), 2, 3));
    }

    let report = orchestrator(2, 1).run(jobs.clone()).await;
    assert!(report.is_success());
    assert_eq!(report.total_pages(), 6);
    assert_eq!(report.total_records(), 18);

    for (job, pages) in jobs.iter().zip(&expected) {
        let name = job.output.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("transactions-1704"), "{name}");
        assert!(name.ends_with(".jsonl.gz"), "{name}");
        assert_eq!(&CheckpointedSink::new(&job.output).records().await?, pages);
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn in_flight_requests_never_exceed_the_limit() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    mirror.set_delay(Duration::from_millis(40));
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let tmp = TempDir::new()?;

    let template = FetchTarget::new(server.url(), "transactions");
    let jobs = window_jobs(&template, &range(2, Step::Hour1), tmp.path());
    assert_eq!(jobs.len(), 48);
    for job in &jobs {
        mirror.serve_chain("transactions", &url::initial_query(&job.target), 2, 1);
    }

    let orchestrator = orchestrator(4, 1);
    let report = orchestrator.run(jobs).await;

    assert!(report.is_success());
    assert_eq!(mirror.hits().len(), 96);
    assert!(mirror.peak_in_flight() <= 4, "peak {}", mirror.peak_in_flight());
    assert!(mirror.peak_in_flight() >= 2, "jobs never overlapped");

    let progress = orchestrator.progress().snapshot();
    assert!(progress.peak_running <= 4);
    assert_eq!(progress.completed, 48);
    assert_eq!(progress.running, 0);
    assert_eq!(progress.pages, 96);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn snapshots_fan_in_without_interleaving() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    mirror.set_delay(Duration::from_millis(5));
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let tmp = TempDir::new()?;

    let template = FetchTarget::new(server.url(), "balances").with_account("0.0.800");
    let output = tmp.path().join(snapshot_file_name("balances", Some("0.0.800")));
    let jobs = snapshot_jobs(&template, &range(1, Step::Minute15), &output);
    assert_eq!(jobs.len(), 96);

    let mut expected = HashSet::new();
    for (n, job) in jobs.iter().enumerate() {
        let body = json!({
            "timestamp": format!("{n}.000000000"),
            "balances": [{ "account": "0.0.800", "balance": n, "padding": "x".repeat(2048) }],
            "links": { "next": null }
        });
        expected.insert(body.to_string());
        mirror.route(url::initial_query(&job.target), body);
    }

    let orchestrator = orchestrator(16, 1);
    let report = orchestrator.run(jobs).await;
    assert!(report.is_success());
    assert_eq!(orchestrator.sinks().len(), 1);

    let sink = CheckpointedSink::new(&output);
    let stats = sink.stats().await?;
    assert_eq!(stats.records, 96);
    assert_eq!(stats.corrupt_records, 0);
    assert_eq!(stats.torn_frames, 0);

    let written: HashSet<String> = sink
        .records()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(written, expected);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn one_failing_job_does_not_stop_the_others() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let tmp = TempDir::new()?;

    let healthy = JobRecord::paginated(
        FetchTarget::new(server.url(), "transactions").with_account("0.0.1"),
        tmp.path().join("healthy.jsonl.gz"),
    );
    mirror.serve_chain("transactions", &url::initial_query(&healthy.target), 3, 1);

    let flaky = JobRecord::paginated(
        FetchTarget::new(server.url(), "transactions").with_account("0.0.2"),
        tmp.path().join("flaky.jsonl.gz"),
    );
    mirror.fail(url::initial_query(&flaky.target), u32::MAX);

    let broken = JobRecord::single_shot(
        FetchTarget::new("not a url", "balances"),
        tmp.path().join("broken.jsonl.gz"),
    );

    let report = orchestrator(3, 2).run(vec![healthy, flaky, broken]).await;
    let statuses: Vec<JobStatus> = report.jobs.iter().map(|j| j.status).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Completed, JobStatus::Incomplete, JobStatus::Failed]
    );
    assert_eq!(report.jobs[0].pages(), 3);
    assert!(report.jobs[2].error.is_some());
    assert!(!report.is_success());
    assert!(!tmp.path().join("flaky.jsonl.gz").exists());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn rerunning_a_finished_plan_is_a_no_op() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let tmp = TempDir::new()?;

    let template = FetchTarget::new(server.url(), "transactions").with_account("0.0.800");
    let plan = range(2, Step::Day1);
    for job in window_jobs(&template, &plan, tmp.path()) {
        mirror.serve_chain("transactions", &url::initial_query(&job.target), 2, 2);
    }

    let first = orchestrator(2, 1)
        .run(window_jobs(&template, &plan, tmp.path()))
        .await;
    assert!(first.is_success());
    let hits = mirror.hits().len();

    let second = orchestrator(2, 1)
        .run(window_jobs(&template, &plan, tmp.path()))
        .await;
    assert!(second.is_success());
    assert_eq!(second.total_pages(), 0);
    assert_eq!(mirror.hits().len(), hits);

    server.shutdown().await;
    Ok(())
}
