//! Record Extractor
//!
//! Turns raw object bytes into an ordered sequence of line-records.

use std::io::BufRead;

use contracts::Record;
use tracing::{debug, instrument, warn};

use crate::error::IngestionError;

/// Result of extracting one object
///
/// `truncated` is set when reading stopped early; `records` then holds every
/// line read before the failure and is still meant to be dispatched.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Records in source order
    pub records: Vec<Record>,

    /// Read failure that cut the sequence short
    pub truncated: Option<IngestionError>,
}

impl Extraction {
    /// Number of records extracted
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract line-records from an in-memory object
pub fn extract_records(bytes: &[u8]) -> Extraction {
    extract_from_reader(bytes)
}

/// Extract line-records from any buffered reader
///
/// One record per `\n`-terminated line, with `\n` and a trailing `\r`
/// stripped. A final line without terminator is kept. Any read error,
/// including a line that is not UTF-8, stops extraction and is reported as
/// a warning.
#[instrument(name = "extract_records", skip(reader))]
pub fn extract_from_reader<R: BufRead>(mut reader: R) -> Extraction {
    let mut extraction = Extraction::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = match reader.read_until(b'\n', &mut buf) {
            Ok(read) => read,
            Err(e) => {
                extraction.truncated = Some(truncation(extraction.len(), e.to_string()));
                break;
            }
        };

        // EOF
        if read == 0 {
            break;
        }

        strip_terminator(&mut buf);

        match String::from_utf8(std::mem::take(&mut buf)) {
            Ok(line) => {
                let index = extraction.len();
                extraction.records.push(Record::new(index, line));
            }
            Err(e) => {
                extraction.truncated = Some(truncation(extraction.len(), e.to_string()));
                break;
            }
        }
    }

    if let Some(ref err) = extraction.truncated {
        warn!(records = extraction.len(), error = %err, "Object read truncated");
    } else {
        debug!(records = extraction.len(), "Object read completed");
    }

    metrics::counter!("line_relay_records_extracted_total").increment(extraction.len() as u64);

    extraction
}

fn strip_terminator(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

fn truncation(line: usize, message: String) -> IngestionError {
    IngestionError::ReadFailed { line, message }
}
