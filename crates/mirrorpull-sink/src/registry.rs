//! Shared sink handles keyed by path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::CheckpointedSink;

/// Hands out one [`CheckpointedSink`] per output path.
///
/// Jobs writing to the same file receive the same handle and therefore
/// serialize on the same lock (fan-in). Jobs writing to different files get
/// different handles and never block each other.
#[derive(Debug, Default)]
pub struct SinkRegistry {
    sinks: Mutex<HashMap<PathBuf, Arc<CheckpointedSink>>>,
}

impl SinkRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sink for `path`, creating it on first use.
    pub fn get(&self, path: impl AsRef<Path>) -> Arc<CheckpointedSink> {
        let key = normalize(path.as_ref());
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            sinks
                .entry(key)
                .or_insert_with_key(|key| Arc::new(CheckpointedSink::new(key.clone()))),
        )
    }

    /// Returns the number of distinct sinks handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no sink has been handed out yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drops `.` components so `./out/a.gz` and `out/a.gz` share one sink.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}
