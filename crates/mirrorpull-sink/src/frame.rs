//! Gzip member framing.
//!
//! One record per gzip member. Decoding walks the file member by member; a
//! member that fails to decode (a torn write) is skipped by resynchronizing
//! at the next gzip header.

use flate2::Compression;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;
use serde_json::Value;
use std::io::{Read, Write};

use crate::SinkError;

/// Gzip member magic plus the deflate method byte.
const GZIP_HEADER: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Encodes one record as a self-contained gzip member holding `json + "\n"`.
pub(crate) fn encode_record(record: &Value, level: Compression) -> Result<Vec<u8>, SinkError> {
    let mut encoder = GzEncoder::new(Vec::new(), level);
    serde_json::to_writer(&mut encoder, record)?;
    encoder.write_all(b"\n").map_err(SinkError::Compress)?;
    encoder.finish().map_err(SinkError::Compress)
}

/// Which decoded lines a scan keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keep {
    /// Every non-empty line.
    All,
    /// Only the final non-empty line.
    Last,
}

/// Result of walking a sink file.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Kept non-empty lines of the complete members, in file order.
    pub(crate) lines: Vec<Vec<u8>>,
    /// Complete members decoded.
    pub(crate) frames: usize,
    /// Members that failed to decode and were skipped.
    pub(crate) torn_frames: usize,
}

/// Decodes every complete member of `data`, keeping lines per `keep`.
pub(crate) fn scan(data: &[u8], keep: Keep) -> Scan {
    let mut result = Scan::default();
    let mut rest: &[u8] = data;
    let mut buf = Vec::new();

    while !rest.is_empty() {
        let offset = data.len() - rest.len();
        buf.clear();
        let decoded = {
            let mut decoder = GzDecoder::new(&mut rest);
            decoder.read_to_end(&mut buf)
        };

        match decoded {
            Ok(_) => {
                result.frames += 1;
                let mut lines = buf
                    .split(|b| *b == b'\n')
                    .filter(|line| !line.iter().all(u8::is_ascii_whitespace));
                match keep {
                    Keep::All => result.lines.extend(lines.map(<[u8]>::to_vec)),
                    Keep::Last => {
                        if let Some(line) = lines.next_back() {
                            result.lines.clear();
                            result.lines.push(line.to_vec());
                        }
                    }
                }
            }
            Err(_) => {
                result.torn_frames += 1;
                match next_header(data, offset + 1) {
                    Some(pos) => rest = &data[pos..],
                    None => break,
                }
            }
        }
    }

    result
}

fn next_header(data: &[u8], from: usize) -> Option<usize> {
    data.get(from..)?
        .windows(GZIP_HEADER.len())
        .position(|w| w == GZIP_HEADER)
        .map(|pos| pos + from)
}
