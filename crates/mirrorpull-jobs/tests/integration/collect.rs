use anyhow::Result;
use mirrorpull_fetch::{
    AttemptError, CollectEnd, FetchError, collect, collect_once, collect_once_into, url,
};
use mirrorpull_sink::CheckpointedSink;
use mirrorpull_types::{FetchTarget, TimeFilter};
use serde_json::json;
use tempfile::TempDir;

use crate::support::helpers::{fast_client, init_tracing};
use crate::support::mock_api::{MockMirror, MockMirrorServer, cursor_query};

fn transactions(base: &str) -> FetchTarget {
    FetchTarget::new(base, "transactions")
        .with_account("0.0.800")
        .with_limit(2)
}

#[tokio::test]
async fn follows_the_chain_to_the_end() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let pages = mirror.serve_chain("transactions", &url::initial_query(&target), 3, 2);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let outcome = collect(&fast_client(), &target, &sink, 1).await?;

    assert_eq!(outcome.end, CollectEnd::Completed);
    assert_eq!(outcome.pages, 3);
    assert_eq!(outcome.records, 6);
    assert!(!outcome.resumed);
    let records = sink.records().await?;
    assert_eq!(records, pages);
    assert!(records[2]["links"]["next"].is_null());
    assert_eq!(mirror.hits().len(), 3);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn transient_failures_are_retried_without_duplicates() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    let pages = mirror.serve_chain("transactions", &first, 3, 2);
    let second = cursor_query("transactions", &first, 1);
    mirror.fail(second.clone(), 3);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let outcome = collect(&fast_client(), &target, &sink, 5).await?;

    assert_eq!(outcome.end, CollectEnd::Completed);
    assert_eq!(sink.records().await?, pages);
    assert_eq!(mirror.hit_count(&second), 4);
    assert_eq!(mirror.hit_count(&first), 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn exhausted_job_resumes_where_it_stopped() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    let pages = mirror.serve_chain("transactions", &first, 3, 2);
    let second = cursor_query("transactions", &first, 1);
    mirror.fail(second.clone(), 10);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let client = fast_client();

    let outcome = collect(&client, &target, &sink, 2).await?;
    assert_eq!(outcome.end, CollectEnd::Exhausted);
    assert_eq!(outcome.pages, 1);
    assert_eq!(mirror.hit_count(&second), 2);
    assert_eq!(sink.records().await?, pages[..1].to_vec());

    mirror.fail(second.clone(), 0);
    let outcome = collect(&client, &target, &sink, 2).await?;
    assert_eq!(outcome.end, CollectEnd::Completed);
    assert!(outcome.resumed);
    assert_eq!(outcome.pages, 2);
    assert_eq!(sink.records().await?, pages);
    assert_eq!(mirror.hit_count(&first), 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn resuming_from_any_prefix_yields_the_same_file() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let pages = mirror.serve_chain("transactions", &url::initial_query(&target), 4, 3);
    let client = fast_client();
    let tmp = TempDir::new()?;

    let full = CheckpointedSink::new(tmp.path().join("full.jsonl.gz"));
    collect(&client, &target, &full, 1).await?;
    let expected = full.records().await?;
    assert_eq!(expected, pages);

    for prefix in 0..=pages.len() {
        let sink = CheckpointedSink::new(tmp.path().join(format!("prefix-{prefix}.jsonl.gz")));
        for page in &pages[..prefix] {
            sink.append(page).await?;
        }

        let outcome = collect(&client, &target, &sink, 1).await?;
        assert_eq!(sink.records().await?, expected, "prefix {prefix}");
        assert_eq!(outcome.pages, pages.len() - prefix, "prefix {prefix}");
        if prefix == pages.len() {
            assert_eq!(outcome.end, CollectEnd::AlreadyComplete);
        }
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn completed_file_makes_no_requests() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    mirror.serve_chain("transactions", &url::initial_query(&target), 2, 2);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let client = fast_client();
    collect(&client, &target, &sink, 1).await?;
    let hits = mirror.hits().len();

    let outcome = collect(&client, &target, &sink, 1).await?;
    assert_eq!(outcome.end, CollectEnd::AlreadyComplete);
    assert_eq!(outcome.pages, 0);
    assert_eq!(mirror.hits().len(), hits);
    assert_eq!(sink.records().await?.len(), 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unusable_checkpoint_restarts_from_first_page() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let pages = mirror.serve_chain("transactions", &url::initial_query(&target), 2, 2);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    sink.append(&json!({ "transactions": [], "links": { "next": 42 } }))
        .await?;

    let outcome = collect(&fast_client(), &target, &sink, 1).await?;
    assert_eq!(outcome.end, CollectEnd::Completed);
    assert!(!outcome.resumed);
    assert_eq!(outcome.pages, 2);

    let records = sink.records().await?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[1..].to_vec(), pages);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn repeated_cursor_stalls() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    let looping = "/api/v1/transactions?cursor=loop";
    mirror.route(
        first.clone(),
        json!({ "transactions": [{ "id": 1 }], "links": { "next": looping } }),
    );
    mirror.route(
        looping,
        json!({ "transactions": [{ "id": 2 }], "links": { "next": looping } }),
    );

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let client = fast_client();
    let outcome = collect(&client, &target, &sink, 1).await?;

    assert_eq!(outcome.end, CollectEnd::Stalled);
    assert_eq!(outcome.pages, 1);
    assert_eq!(mirror.hit_count(looping), 1);
    assert_eq!(sink.records().await?.len(), 1);

    for run in 1..=3 {
        let outcome = collect(&client, &target, &sink, 1).await?;
        assert_eq!(outcome.end, CollectEnd::Stalled, "rerun {run}");
        assert!(outcome.resumed, "rerun {run}");
        assert_eq!(outcome.pages, 0, "rerun {run}");
        assert_eq!(sink.records().await?.len(), 1, "rerun {run}");
    }
    assert_eq!(mirror.hit_count(&first), 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn rerunning_a_longer_cycle_appends_nothing() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    let a = "/api/v1/transactions?cursor=a";
    let b = "/api/v1/transactions?cursor=b";
    mirror.route(
        first,
        json!({ "transactions": [{ "id": 1 }], "links": { "next": a } }),
    );
    mirror.route(a, json!({ "transactions": [{ "id": 2 }], "links": { "next": b } }));
    mirror.route(b, json!({ "transactions": [{ "id": 3 }], "links": { "next": a } }));

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let client = fast_client();

    let outcome = collect(&client, &target, &sink, 1).await?;
    assert_eq!(outcome.end, CollectEnd::Stalled);
    assert_eq!(outcome.pages, 2);
    let persisted = sink.records().await?;

    for run in 1..=3 {
        let outcome = collect(&client, &target, &sink, 1).await?;
        assert_eq!(outcome.end, CollectEnd::Stalled, "rerun {run}");
        assert_eq!(outcome.pages, 0, "rerun {run}");
        assert_eq!(sink.records().await?, persisted, "rerun {run}");
    }
    assert_eq!(mirror.hit_count(a), 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_retried_then_persisted() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    let pages = mirror.serve_chain("transactions", &first, 2, 2);
    let second = cursor_query("transactions", &first, 1);
    mirror.garble(second.clone(), 2);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("tx.jsonl.gz"));
    let outcome = collect(&fast_client(), &target, &sink, 3).await?;

    assert_eq!(outcome.end, CollectEnd::Completed);
    assert_eq!(sink.records().await?, pages);
    assert_eq!(mirror.hit_count(&second), 3);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn persistently_malformed_body_exhausts() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = transactions(server.url());
    let first = url::initial_query(&target);
    mirror.serve_chain("transactions", &first, 1, 2);
    mirror.garble(first.clone(), 10);

    let client = fast_client();
    let request_url = url::initial_url(&target);
    let err = client
        .fetch(&request_url, "transactions", 2)
        .await
        .expect_err("every attempt returns a malformed body");
    match err {
        FetchError::Exhausted {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 2);
            assert!(matches!(last_error, AttemptError::Parse(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mirror.hit_count(&first), 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn empty_snapshot_writes_nothing() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = FetchTarget::new(server.url(), "balances")
        .with_account("0.0.800")
        .with_time_filter(TimeFilter::At(1704067200));
    mirror.route(
        url::initial_query(&target),
        json!({ "timestamp": null, "balances": [], "links": { "next": null } }),
    );

    let client = fast_client();
    assert_eq!(collect_once(&client, &target, 1).await?, None);

    let tmp = TempDir::new()?;
    let sink = CheckpointedSink::new(tmp.path().join("balances_0.0.800.jsonl.gz"));
    let outcome = collect_once_into(&client, &target, &sink, 1).await?;
    assert_eq!(outcome.end, CollectEnd::Empty);
    assert_eq!(outcome.pages, 0);
    assert!(!sink.exists());

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn snapshot_returns_the_payload_as_one_line() -> Result<()> {
    init_tracing();
    let mirror = MockMirror::new();
    let server = MockMirrorServer::start(mirror.clone()).await?;
    let target = FetchTarget::new(server.url(), "balances")
        .with_account("0.0.800")
        .with_time_filter(TimeFilter::At(1704067200));
    let body = json!({
        "timestamp": "1704067200.000000000",
        "balances": [{ "account": "0.0.800", "balance": 5 }],
        "links": { "next": null }
    });
    mirror.route(url::initial_query(&target), body.clone());

    let line = collect_once(&fast_client(), &target, 1)
        .await?
        .expect("balance snapshot");
    assert!(!line.contains('\n'));
    assert_eq!(serde_json::from_str::<serde_json::Value>(&line)?, body);

    server.shutdown().await;
    Ok(())
}
