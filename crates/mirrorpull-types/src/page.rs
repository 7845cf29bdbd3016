//! Pages, cursors and checkpoints.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::CheckpointError;

/// Opaque continuation token taken from a page's `links.next`.
///
/// Usually a path plus query string relative to the API base URL, e.g.
/// `/api/v1/transactions?account.id=0.0.800&limit=100&timestamp=gt:1700000000.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Into, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Creates a cursor from a raw continuation string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw continuation string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the cursor is an absolute URL rather than a path.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

/// One parsed API response carrying at least one record.
///
/// The raw payload is kept verbatim so it can be persisted as-is; the
/// continuation cursor and record count are derived once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    raw: Value,
    record_count: usize,
    next: Option<Cursor>,
}

impl Page {
    /// Builds a page from a parsed payload.
    ///
    /// Returns `None` when the payload carries no data under `data_key`
    /// (key missing, null, or an empty array). That is the API's way of
    /// saying there is nothing at this position, not an error.
    #[must_use]
    pub fn from_payload(raw: Value, data_key: &str) -> Option<Self> {
        let record_count = match raw.get(data_key)? {
            Value::Null => return None,
            Value::Array(items) if items.is_empty() => return None,
            Value::Array(items) => items.len(),
            // A non-array payload (e.g. a single object) counts as one record.
            _ => 1,
        };

        // A malformed `links.next` on a fresh page ends the stream.
        let next = continuation(&raw).ok().flatten();

        Some(Self {
            raw,
            record_count,
            next,
        })
    }

    /// Returns the raw payload.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consumes the page and returns the raw payload.
    #[must_use]
    pub fn into_raw(self) -> Value {
        self.raw
    }

    /// Returns the number of records in the page.
    #[must_use]
    pub const fn record_count(&self) -> usize {
        self.record_count
    }

    /// Returns the continuation cursor, if the stream goes on.
    #[must_use]
    pub const fn next_cursor(&self) -> Option<&Cursor> {
        self.next.as_ref()
    }

    /// Returns true if this is the last page of the stream.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next.is_none()
    }
}

/// Resume position recovered from the last persisted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checkpoint {
    /// The stream continues at this cursor.
    Resume(Cursor),
    /// The last persisted page ended the stream.
    Finished,
}

impl Checkpoint {
    /// Reconstructs a checkpoint from a persisted page.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not have the shape of an API page.
    pub fn from_record(record: &Value) -> Result<Self, CheckpointError> {
        Ok(continuation(record)?.map_or(Self::Finished, Self::Resume))
    }
}

/// Extracts `links.next` from a page payload.
///
/// A missing `links` object, a missing `next`, a null `next` and an empty
/// string all mean end-of-stream.
fn continuation(record: &Value) -> Result<Option<Cursor>, CheckpointError> {
    let object = record.as_object().ok_or(CheckpointError::NotAnObject)?;

    let links = match object.get("links") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(links)) => links,
        Some(_) => return Err(CheckpointError::InvalidLinks),
    };

    match links.get("next") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(next)) if next.is_empty() => Ok(None),
        Some(Value::String(next)) => Ok(Some(Cursor::new(next.clone()))),
        Some(_) => Err(CheckpointError::InvalidNext),
    }
}
