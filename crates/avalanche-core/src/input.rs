//! Spike stream input.
//!
//! One row per time step: `timestamp,node,node,...`. No header. Fields may
//! carry surrounding whitespace and a row may end with a trailing comma.
//! Rows are expected in non-decreasing timestamp order; the reader does not
//! check this.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use avalanche_types::{NodeId, SpikeRow, Timestamp};

use crate::error::DetectError;

/// Streaming reader turning CSV records into [`SpikeRow`]s.
pub struct SpikeReader<R> {
    records: csv::StringRecordsIntoIter<R>,
}

impl SpikeReader<File> {
    /// Open the spike file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Csv`] if the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, DetectError> {
        let reader = builder().from_path(path)?;
        Ok(Self {
            records: reader.into_records(),
        })
    }
}

impl<R: Read> SpikeReader<R> {
    /// Read spike rows from any byte source.
    pub fn new(source: R) -> Self {
        Self {
            records: builder().from_reader(source).into_records(),
        }
    }
}

impl<R: Read> Iterator for SpikeReader<R> {
    type Item = Result<SpikeRow, DetectError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            // Blank lines carry no spikes.
            if record.iter().all(str::is_empty) {
                continue;
            }
            return Some(parse_record(&record));
        }
    }
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn parse_record(record: &csv::StringRecord) -> Result<SpikeRow, DetectError> {
    let line = record.position().map_or(0, csv::Position::line);
    let malformed = |reason: String| DetectError::MalformedRow { line, reason };

    let mut fields = record.iter();
    let raw_timestamp = fields.next().unwrap_or_default();
    let timestamp: Timestamp = raw_timestamp
        .parse()
        .map_err(|e| malformed(format!("timestamp {raw_timestamp:?}: {e}")))?;

    let mut nodes = Vec::with_capacity(record.len().saturating_sub(1));
    let field_count = record.len();
    for (index, raw) in fields.enumerate() {
        if raw.is_empty() {
            // Only a single trailing empty field is tolerated.
            if index.saturating_add(2) == field_count {
                break;
            }
            return Err(malformed(format!("empty node field {}", index.saturating_add(1))));
        }
        let node: u32 = raw
            .parse()
            .map_err(|e| malformed(format!("node {raw:?}: {e}")))?;
        nodes.push(NodeId(node));
    }

    if nodes.is_empty() {
        return Err(malformed(format!("time step {timestamp} has no spikes")));
    }
    Ok(SpikeRow::new(timestamp, nodes))
}
