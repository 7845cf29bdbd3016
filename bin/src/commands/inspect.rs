//! Inspect command: summarize a downloaded file.

use crate::commands::export::data_key_from_path;
use anyhow::{Context, Result, bail};
use mirrorpull_lib::{Checkpoint, CheckpointedSink, Page, SinkError};
use serde_json::Value;
use std::path::Path;

/// Where a rerun would pick up.
#[derive(Debug, PartialEq, Eq)]
enum ResumeState {
    Complete,
    Resumable(String),
    Unusable(String),
}

impl std::fmt::Display for ResumeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "complete"),
            Self::Resumable(cursor) => write!(f, "resumes at {cursor}"),
            Self::Unusable(reason) => write!(f, "restarts from the first page ({reason})"),
        }
    }
}

/// Prints page and record counts and the resume position of `input`.
pub(crate) async fn inspect(input: &Path, key: Option<&str>) -> Result<()> {
    let sink = CheckpointedSink::new(input);
    if !sink.exists() {
        bail!("File not found: {}", input.display());
    }
    let key = key.map_or_else(|| data_key_from_path(input), str::to_string);

    let stats = sink
        .stats()
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let pages = sink.records().await?;
    let rows = count_rows(&pages, &key);

    let state = match sink.read_last_record().await {
        Ok(Some(last)) => resume_state(&last),
        Ok(None) => ResumeState::Unusable("no complete page".to_string()),
        Err(e @ SinkError::CorruptRecord { .. }) => ResumeState::Unusable(e.to_string()),
        Err(e) => return Err(e.into()),
    };

    println!("File:     {}", input.display());
    println!("Size:     {} bytes", stats.bytes);
    println!("Pages:    {}", stats.records);
    println!("Records:  {rows} ({key})");
    if stats.corrupt_records > 0 || stats.torn_frames > 0 {
        println!(
            "Damaged:  {} unparseable pages, {} torn writes skipped",
            stats.corrupt_records, stats.torn_frames
        );
    }
    println!("State:    {state}");
    Ok(())
}

fn count_rows(pages: &[Value], key: &str) -> usize {
    pages
        .iter()
        .filter_map(|page| Page::from_payload(page.clone(), key))
        .map(|page| page.record_count())
        .sum()
}

fn resume_state(last: &Value) -> ResumeState {
    match Checkpoint::from_record(last) {
        Ok(Checkpoint::Finished) => ResumeState::Complete,
        Ok(Checkpoint::Resume(cursor)) => ResumeState::Resumable(cursor.to_string()),
        Err(e) => ResumeState::Unusable(e.to_string()),
    }
}
