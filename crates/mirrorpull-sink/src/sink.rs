//! Checkpointed gzip JSONL sink.

use flate2::Compression;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::SinkError;
use crate::frame::{self, Keep, Scan};

/// Counts describing the content of a sink file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinkStats {
    /// Size of the file in bytes.
    pub bytes: u64,
    /// Complete gzip members.
    pub frames: usize,
    /// Lines that parse as JSON.
    pub records: usize,
    /// Lines inside complete members that do not parse as JSON.
    pub corrupt_records: usize,
    /// Members that failed to decode (interrupted appends).
    pub torn_frames: usize,
}

/// Append-only compressed record store backing one output file.
///
/// All operations on one sink are serialized by an async mutex. Jobs that
/// share an output file must share the same `CheckpointedSink` (see
/// [`crate::SinkRegistry`]); sinks for different files never contend.
#[derive(Debug)]
pub struct CheckpointedSink {
    path: PathBuf,
    level: Compression,
    lock: Mutex<()>,
}

impl CheckpointedSink {
    /// Creates a sink for the given file. Nothing is touched on disk until
    /// the first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            level: Compression::default(),
            lock: Mutex::new(()),
        }
    }

    /// Sets the gzip compression level.
    #[must_use]
    pub const fn with_compression(mut self, level: Compression) -> Self {
        self.level = level;
        self
    }

    /// Returns the sink file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the sink file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Appends one record as a single compressed line.
    ///
    /// The record is fully serialized and compressed before the lock is
    /// taken; the write itself is one `write_all` followed by `sync_data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or the file cannot
    /// be written.
    pub async fn append(&self, record: &Value) -> Result<(), SinkError> {
        let encoded = frame::encode_record(record, self.level)?;
        let _guard = self.lock.lock().await;

        let path = self.path.clone();
        let len = encoded.len();
        run_blocking(move || write_frame(&path, &encoded)).await?;

        debug!(path = %self.path.display(), bytes = len, "appended record");
        Ok(())
    }

    /// Returns the last complete record, or `None` if the sink is empty or
    /// missing.
    ///
    /// Interrupted appends are invisible here: only records whose gzip
    /// member decoded completely are considered.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::CorruptRecord`] if the last complete line does
    /// not parse as JSON, or an I/O error if the file cannot be read.
    pub async fn read_last_record(&self) -> Result<Option<Value>, SinkError> {
        let scan = self.scan(Keep::Last).await?;
        let Some(line) = scan.lines.last() else {
            return Ok(None);
        };

        serde_json::from_slice(line)
            .map(Some)
            .map_err(|source| SinkError::CorruptRecord {
                path: self.path.clone(),
                source,
            })
    }

    /// Returns every record that parses as JSON, in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn records(&self) -> Result<Vec<Value>, SinkError> {
        let scan = self.scan(Keep::All).await?;
        let mut records = Vec::with_capacity(scan.lines.len());
        for line in &scan.lines {
            match serde_json::from_slice(line) {
                Ok(value) => records.push(value),
                Err(e) => warn!(path = %self.path.display(), error = %e, "skipping corrupt record"),
            }
        }
        Ok(records)
    }

    /// Returns frame and record counts for the sink file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn stats(&self) -> Result<SinkStats, SinkError> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let (bytes, scan) = run_blocking(move || {
            let data = read_file(&path)?;
            Ok((data.len() as u64, frame::scan(&data, Keep::All)))
        })
        .await?;

        let records = scan
            .lines
            .iter()
            .filter(|line| serde_json::from_slice::<Value>(line).is_ok())
            .count();

        Ok(SinkStats {
            bytes,
            frames: scan.frames,
            records,
            corrupt_records: scan.lines.len() - records,
            torn_frames: scan.torn_frames,
        })
    }

    async fn scan(&self, keep: Keep) -> Result<Scan, SinkError> {
        let _guard = self.lock.lock().await;
        let path = self.path.clone();
        let scan =
            run_blocking(move || read_file(&path).map(|data| frame::scan(&data, keep))).await?;

        if scan.torn_frames > 0 {
            warn!(
                path = %self.path.display(),
                torn = scan.torn_frames,
                "skipped incomplete gzip members"
            );
        }
        Ok(scan)
    }
}

fn write_frame(path: &Path, encoded: &[u8]) -> Result<(), SinkError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| SinkError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let write_err = |source| SinkError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(encoded).map_err(write_err)?;
    file.sync_data().map_err(write_err)
}

fn read_file(path: &Path) -> Result<Vec<u8>, SinkError> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(SinkError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Runs blocking file I/O off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, SinkError>
where
    F: FnOnce() -> Result<T, SinkError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SinkError::Task(e.to_string()))?
}
