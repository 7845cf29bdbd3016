//! Export command: flatten downloaded pages to NDJSON.

use anyhow::{Context, Result, bail};
use mirrorpull_lib::CheckpointedSink;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every record under `key` of every page in `input` as one JSON line.
pub(crate) async fn export(input: &Path, output: Option<&Path>, key: Option<&str>) -> Result<()> {
    let sink = CheckpointedSink::new(input);
    if !sink.exists() {
        bail!("File not found: {}", input.display());
    }
    let key = key.map_or_else(|| data_key_from_path(input), str::to_string);

    let pages = sink
        .records()
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let written = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let n = write_rows(&pages, &key, &mut writer)?;
            writer.flush()?;
            n
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            let n = write_rows(&pages, &key, &mut writer)?;
            writer.flush()?;
            n
        }
    };

    tracing::info!(pages = pages.len(), rows = written, key = %key, "export finished");
    Ok(())
}

/// Infers the data key from a file name such as `transactions-1-2.jsonl.gz`
/// or `balances_0.0.800.jsonl.gz`.
pub(crate) fn data_key_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.split(['-', '_', '.'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Writes the flattened rows and returns how many were written.
fn write_rows<W: Write>(pages: &[Value], key: &str, writer: &mut W) -> Result<usize> {
    let mut written = 0;
    for row in flatten(pages, key) {
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    Ok(written)
}

/// Yields the items under `key` of each page.
///
/// A page-level `timestamp` (snapshot responses) is copied onto object rows
/// that lack one, so rows from different snapshots stay distinguishable.
fn flatten<'a>(pages: &'a [Value], key: &'a str) -> impl Iterator<Item = Value> + 'a {
    pages.iter().flat_map(move |page| {
        let stamp = page.get("timestamp").filter(|t| !t.is_null()).cloned();
        let items: Vec<Value> = match page.get(key) {
            Some(Value::Array(items)) => items.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => vec![other.clone()],
        };
        items.into_iter().map(move |mut item| {
            if let (Some(stamp), Some(object)) = (&stamp, item.as_object_mut()) {
                object
                    .entry("timestamp")
                    .or_insert_with(|| stamp.clone());
            }
            item
        })
    })
}
