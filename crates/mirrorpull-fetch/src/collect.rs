//! Paginated and single-shot collectors.

use mirrorpull_sink::{CheckpointedSink, SinkError};
use mirrorpull_types::{Checkpoint, Cursor, FetchTarget, Page};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

use crate::{FetchClient, FetchError, url};

/// How a collection ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectEnd {
    /// The last fetched page had no continuation (or the single record was written).
    Completed,
    /// The sink already held the final page; no request was made.
    AlreadyComplete,
    /// The API returned no data at the current position.
    Empty,
    /// A request failed on every attempt.
    Exhausted,
    /// The API pointed back at a cursor already followed. The page carrying
    /// that continuation is not persisted.
    Stalled,
}

impl CollectEnd {
    /// Returns the end state as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::AlreadyComplete => "already-complete",
            Self::Empty => "empty",
            Self::Exhausted => "exhausted",
            Self::Stalled => "stalled",
        }
    }

    /// Returns true if the stream is known to be fully persisted.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Completed | Self::AlreadyComplete)
    }
}

impl std::fmt::Display for CollectEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOutcome {
    /// How the collection ended.
    pub end: CollectEnd,
    /// Pages appended to the sink during this run.
    pub pages: usize,
    /// Records contained in those pages.
    pub records: usize,
    /// Whether the run continued from a checkpoint.
    pub resumed: bool,
}

impl CollectOutcome {
    const fn new(end: CollectEnd) -> Self {
        Self {
            end,
            pages: 0,
            records: 0,
            resumed: false,
        }
    }
}

/// Errors that abort a collection.
///
/// Retry exhaustion and empty responses are not errors; see [`CollectEnd`].
#[derive(Error, Debug)]
pub enum CollectError {
    /// The sink could not be read or written.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// A request can never succeed.
    #[error(transparent)]
    Fetch(FetchError),
}

/// Fetches every page of `target`, appending each one to `sink`.
///
/// If the sink already holds pages, the collection resumes from the
/// continuation cursor of the last one; if that page ended the stream,
/// nothing is fetched. A last record that cannot be used as a checkpoint is
/// logged and the collection restarts from the first page without touching
/// existing data.
///
/// Each page is appended before its cursor is followed, so a crash at any
/// point leaves the sink resumable. A page whose continuation points back at
/// a cursor already followed (in this run or by an earlier one on the same
/// sink) is not appended and the collection ends as [`CollectEnd::Stalled`];
/// rerunning a stalled collection appends nothing.
///
/// # Errors
///
/// Returns an error if the sink fails or the request URL is unusable.
/// Exhausted retries end the collection early with
/// [`CollectEnd::Exhausted`].
#[tracing::instrument(
    name = "collect",
    skip_all,
    fields(resource = %target.resource, sink = %sink.path().display())
)]
pub async fn collect(
    client: &FetchClient,
    target: &FetchTarget,
    sink: &CheckpointedSink,
    max_retries: u32,
) -> Result<CollectOutcome, CollectError> {
    let mut cursor = match resume_point(sink).await? {
        Resume::Fresh => None,
        Resume::From(cursor) => Some(cursor),
        Resume::Done => {
            info!("last persisted page ends the stream, nothing to fetch");
            return Ok(CollectOutcome::new(CollectEnd::AlreadyComplete));
        }
    };

    let mut outcome = CollectOutcome::new(CollectEnd::Completed);
    outcome.resumed = cursor.is_some();
    let mut followed = match &cursor {
        Some(_) => persisted_cursors(sink).await?,
        None => HashSet::new(),
    };
    followed.extend(cursor.iter().cloned());

    loop {
        let request_url = match &cursor {
            Some(cursor) => url::cursor_url(&target.base_url, cursor),
            None => url::initial_url(target),
        };

        let page = match client
            .fetch(&request_url, target.data_key(), max_retries)
            .await
        {
            Ok(Some(page)) => page,
            Ok(None) => {
                outcome.end = CollectEnd::Empty;
                break;
            }
            Err(FetchError::Exhausted { .. }) => {
                warn!(url = %request_url, "giving up on this job");
                outcome.end = CollectEnd::Exhausted;
                break;
            }
            Err(e) => return Err(CollectError::Fetch(e)),
        };

        let next = page.next_cursor().cloned();
        if let Some(next) = next.as_ref().filter(|next| followed.contains(*next)) {
            warn!(
                url = %request_url,
                cursor = %next,
                "continuation points back to a followed cursor, stopping"
            );
            outcome.end = CollectEnd::Stalled;
            break;
        }

        let records = page.record_count();
        sink.append(page.raw()).await?;
        outcome.pages += 1;
        outcome.records += records;
        info!(url = %request_url, records, "persisted page");

        match next {
            None => {
                info!(pages = outcome.pages, "no more pages");
                outcome.end = CollectEnd::Completed;
                break;
            }
            Some(next) => {
                followed.insert(next.clone());
                cursor = Some(next);
            }
        }
    }

    Ok(outcome)
}

enum Resume {
    Fresh,
    From(Cursor),
    Done,
}

async fn resume_point(sink: &CheckpointedSink) -> Result<Resume, CollectError> {
    let record = match sink.read_last_record().await {
        Ok(Some(record)) => record,
        Ok(None) => return Ok(Resume::Fresh),
        Err(e @ SinkError::CorruptRecord { .. }) => {
            warn!(error = %e, "unusable checkpoint, starting from the first page");
            return Ok(Resume::Fresh);
        }
        Err(e) => return Err(e.into()),
    };

    match Checkpoint::from_record(&record) {
        Ok(Checkpoint::Resume(cursor)) => {
            info!(cursor = %cursor, "resuming from last persisted page");
            Ok(Resume::From(cursor))
        }
        Ok(Checkpoint::Finished) => Ok(Resume::Done),
        Err(e) => {
            warn!(error = %e, "unusable checkpoint, starting from the first page");
            Ok(Resume::Fresh)
        }
    }
}

/// Continuation cursors of every persisted page. All but the last have been
/// followed; the last is about to be.
async fn persisted_cursors(sink: &CheckpointedSink) -> Result<HashSet<Cursor>, CollectError> {
    let records = sink.records().await?;
    Ok(records
        .iter()
        .filter_map(|record| match Checkpoint::from_record(record) {
            Ok(Checkpoint::Resume(cursor)) => Some(cursor),
            _ => None,
        })
        .collect())
}

/// Fetches `target` exactly once and returns the payload as one JSON line.
///
/// No pagination and no resume. Returns `None` when the API has no data for
/// the target or every attempt failed; the latter is logged.
///
/// # Errors
///
/// Returns an error only if the request URL is unusable.
pub async fn collect_once(
    client: &FetchClient,
    target: &FetchTarget,
    max_retries: u32,
) -> Result<Option<String>, CollectError> {
    let Some(page) = fetch_single(client, target, max_retries).await?.1 else {
        return Ok(None);
    };
    serde_json::to_string(page.raw())
        .map(Some)
        .map_err(|e| CollectError::Sink(SinkError::Serialize(e)))
}

/// Fetches `target` once and appends the payload to a (possibly shared) sink.
///
/// Writes go through the sink's lock, so any number of concurrent
/// single-shot jobs can fan in to one file.
///
/// # Errors
///
/// Returns an error if the sink fails or the request URL is unusable.
pub async fn collect_once_into(
    client: &FetchClient,
    target: &FetchTarget,
    sink: &CheckpointedSink,
    max_retries: u32,
) -> Result<CollectOutcome, CollectError> {
    let (end, page) = fetch_single(client, target, max_retries).await?;
    let mut outcome = CollectOutcome::new(end);

    if let Some(page) = page {
        sink.append(page.raw()).await?;
        outcome.pages = 1;
        outcome.records = page.record_count();
    }
    Ok(outcome)
}

async fn fetch_single(
    client: &FetchClient,
    target: &FetchTarget,
    max_retries: u32,
) -> Result<(CollectEnd, Option<Page>), CollectError> {
    let request_url = url::initial_url(target);
    match client
        .fetch(&request_url, target.data_key(), max_retries)
        .await
    {
        Ok(Some(page)) => Ok((CollectEnd::Completed, Some(page))),
        Ok(None) => Ok((CollectEnd::Empty, None)),
        Err(FetchError::Exhausted { .. }) => {
            warn!(url = %request_url, "no data fetched, moving on");
            Ok((CollectEnd::Exhausted, None))
        }
        Err(e) => Err(CollectError::Fetch(e)),
    }
}
