//! Append-only CSV output sink
//!
//! The header is written once per sink lifetime: by the first append to a
//! missing or empty file, or never, when the file already has content (its
//! header is read back instead). A fresh header always ends with the `error`
//! and `raw_content` columns so later failures have somewhere to go. Rows are
//! projected onto that header; columns the header lacks are dropped with a
//! warning.

use crate::error::SinkError;
use crate::row::{OutputRow, ERROR_COLUMN, RAW_CONTENT_COLUMN};
use crate::source::read_headers;
use litminer_domain::EventSender;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// CSV file that batches are appended to
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    header: Option<Vec<String>>,
    events: EventSender,
}

impl CsvSink {
    /// Create a sink for `path`; nothing is touched until the first append
    pub fn new(path: impl Into<PathBuf>, events: EventSender) -> Self {
        Self {
            path: path.into(),
            header: None,
            events,
        }
    }

    /// Path of the output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The column layout, once fixed
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Append `rows` with a single write
    ///
    /// On error nothing is recorded as written and the caller keeps the rows.
    pub fn append(&mut self, rows: &[OutputRow]) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let (header, write_header) = match &self.header {
            Some(header) => (header.clone(), false),
            None if has_content(&self.path) => (read_headers(&self.path, &self.events)?, false),
            None => (union_columns(rows), true),
        };

        self.warn_dropped_columns(&header, rows);
        let bytes = serialize(&header, rows, write_header)?;

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&bytes)?;
        file.flush()?;

        self.header = Some(header);
        Ok(rows.len())
    }

    fn warn_dropped_columns(&self, header: &[String], rows: &[OutputRow]) {
        let dropped: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys())
            .filter(|key| !header.contains(key))
            .map(String::as_str)
            .collect();
        if !dropped.is_empty() {
            self.events.warn(format!(
                "Output file has no column for {}; these values were not saved",
                dropped.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
    }
}

fn has_content(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn union_columns(rows: &[OutputRow]) -> Vec<String> {
    let failure_columns = [ERROR_COLUMN, RAW_CONTENT_COLUMN];
    let mut columns: Vec<String> = Vec::new();
    for key in rows.iter().flat_map(|row| row.keys()) {
        if !failure_columns.contains(&key.as_str()) && !columns.contains(key) {
            columns.push(key.clone());
        }
    }
    columns.extend(failure_columns.iter().map(|c| c.to_string()));
    columns
}

fn serialize(header: &[String], rows: &[OutputRow], write_header: bool) -> Result<Vec<u8>, SinkError> {
    let mut buffer = Vec::new();
    if write_header {
        buffer.extend_from_slice(UTF8_BOM);
    }

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(buffer);
    if write_header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(header.iter().map(|column| row.get(column).map(String::as_str).unwrap_or("")))?;
    }
    writer
        .into_inner()
        .map_err(|e| SinkError::Io(e.into_error()))
}
