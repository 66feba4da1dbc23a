//! Tabular source reader
//!
//! Loads a CSV file into memory. Bytes are decoded as UTF-8 (a leading BOM
//! is stripped); files exported by spreadsheet tools on Chinese-locale
//! systems are often GBK, so a failed UTF-8 decode falls back to GBK.
//!
//! The same reader loads an existing output sink when computing the resume
//! set.

use crate::config::ColumnNames;
use crate::error::TableError;
use indexmap::IndexMap;
use litminer_domain::{DocumentRecord, EventSender};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reader behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Fail with [`TableError::Encoding`] when the fallback decode needed
    /// replacement characters
    pub strict_fallback: bool,
}

/// Encoding a table was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// UTF-8, with or without BOM
    Utf8,
    /// GBK fallback
    Gbk,
}

/// An in-memory CSV table
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    encoding: SourceEncoding,
}

impl Table {
    /// Column names in file order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows; every row has one cell per header
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encoding the file was decoded with
    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of a column, in row order
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Convert rows to document records
    ///
    /// When the UID column is missing, a UID column holding the 0-based row
    /// index is appended to every record's fields. The returned flag reports
    /// whether that happened.
    pub fn to_records(&self, columns: &ColumnNames) -> (Vec<DocumentRecord>, bool) {
        let uid_index = self.column_index(&columns.uid);
        let title_index = self.column_index(&columns.title);
        let abstract_index = self.column_index(&columns.abstract_text);

        let records = self
            .rows
            .iter()
            .enumerate()
            .map(|(row_number, row)| {
                let mut fields: IndexMap<String, String> = self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();

                let uid = match uid_index {
                    Some(index) => row[index].clone(),
                    None => {
                        let synthesized = row_number.to_string();
                        fields.insert(columns.uid.clone(), synthesized.clone());
                        synthesized
                    }
                };
                let title = title_index.map(|i| row[i].clone()).unwrap_or_default();
                let abstract_text = abstract_index.map(|i| row[i].clone()).unwrap_or_default();

                DocumentRecord::new(uid, title, abstract_text, fields)
            })
            .collect();

        (records, uid_index.is_none())
    }
}

/// Columns from `required` that `table` lacks, in the order given
pub fn validate_required_columns(table: &Table, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !table.has_column(name))
        .map(|name| name.to_string())
        .collect()
}

/// Read a CSV file
///
/// # Errors
///
/// - [`TableError::FileNotFound`] if `path` does not exist
/// - [`TableError::Encoding`] for a lossy fallback decode in strict mode
/// - [`TableError::Parse`] for a missing header row or ragged rows
/// - [`TableError::Io`] for other read failures
pub fn read_table(
    path: &Path,
    options: &ReaderOptions,
    events: &EventSender,
) -> Result<Table, TableError> {
    if !path.exists() {
        return Err(TableError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let (text, encoding) = decode(&bytes, path, options, events)?;
    let (headers, rows) = parse_csv(&text)?;
    Ok(Table { headers, rows, encoding })
}

/// Read only the header row of a CSV file
pub fn read_headers(path: &Path, events: &EventSender) -> Result<Vec<String>, TableError> {
    if !path.exists() {
        return Err(TableError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let (text, _) = decode(&bytes, path, &ReaderOptions::default(), events)?;
    let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(TableError::Parse("missing header row".to_string()));
    }
    Ok(headers)
}

fn decode(
    bytes: &[u8],
    path: &Path,
    options: &ReaderOptions,
    events: &EventSender,
) -> Result<(String, SourceEncoding), TableError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok((text.to_string(), SourceEncoding::Utf8)),
        Err(e) => {
            events.warn(format!(
                "{} is not valid UTF-8 ({}); retrying with GBK",
                path.display(),
                e
            ));
            let (text, had_errors) = encoding_rs::GBK.decode_without_bom_handling(bytes);
            if had_errors {
                if options.strict_fallback {
                    return Err(TableError::Encoding {
                        path: path.display().to_string(),
                        message: "neither valid UTF-8 nor valid GBK".to_string(),
                    });
                }
                events.warn(format!(
                    "{} contains bytes invalid in GBK; they were replaced",
                    path.display()
                ));
            }
            Ok((text.into_owned(), SourceEncoding::Gbk))
        }
    }
}

fn parse_csv(text: &str) -> Result<(Vec<String>, Vec<Vec<String>>), TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::Parse("missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_bytes(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn read(bytes: &[u8]) -> Result<Table, TableError> {
        let file = write_bytes(bytes);
        read_table(file.path(), &ReaderOptions::default(), &EventSender::detached())
    }

    #[test]
    fn test_reads_utf8_with_bom() {
        let table = read(b"\xEF\xBB\xBFUID,Article Title,Abstract\n1,A,x\n2,B,\n").unwrap();
        assert_eq!(table.headers(), ["UID", "Article Title", "Abstract"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.encoding(), SourceEncoding::Utf8);
        assert_eq!(table.column_values("UID").unwrap(), vec!["1", "2"]);
        assert_eq!(table.column_values("Abstract").unwrap(), vec!["x", ""]);
    }

    #[test]
    fn test_quoted_fields_with_newlines() {
        let table = read(b"Article Title,Abstract\n\"Line one\nline two\",\"a, b\"\n").unwrap();
        assert_eq!(table.rows()[0][0], "Line one\nline two");
        assert_eq!(table.rows()[0][1], "a, b");
    }

    #[test]
    fn test_gbk_fallback() {
        let (bytes, _, _) = encoding_rs::GBK.encode("Article Title,Abstract\n钙钛矿,摘要\n");
        let table = read(&bytes).unwrap();
        assert_eq!(table.encoding(), SourceEncoding::Gbk);
        assert_eq!(table.rows()[0], vec!["钙钛矿".to_string(), "摘要".to_string()]);
    }

    #[test]
    fn test_lossy_fallback_strict_and_lenient() {
        let bytes = b"Article Title,Abstract\nA\xFF,B\n";

        let lenient = read(bytes).unwrap();
        assert!(lenient.rows()[0][0].contains('\u{FFFD}'));

        let file = write_bytes(bytes);
        let strict = read_table(
            file.path(),
            &ReaderOptions { strict_fallback: true },
            &EventSender::detached(),
        );
        assert!(matches!(strict, Err(TableError::Encoding { .. })));
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let err = read(b"Article Title,Abstract\nA,B,C\n").unwrap_err();
        assert!(matches!(err, TableError::Parse(_)));
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        assert!(matches!(read(b"").unwrap_err(), TableError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_table(
            &dir.path().join("absent.csv"),
            &ReaderOptions::default(),
            &EventSender::detached(),
        )
        .unwrap_err();
        assert!(matches!(err, TableError::FileNotFound(_)));
    }

    #[test]
    fn test_validate_required_columns() {
        let table = read(b"Title,Abstract\nA,B\n").unwrap();
        assert_eq!(
            validate_required_columns(&table, &["Article Title", "Abstract"]),
            vec!["Article Title".to_string()]
        );
        assert!(validate_required_columns(&table, &["Title"]).is_empty());
    }

    #[test]
    fn test_records_with_uid_column() {
        let table = read(b"UID,Article Title,Abstract,Year\nW1,A,x,2020\n").unwrap();
        let (records, synthesized) = table.to_records(&ColumnNames::default());
        assert!(!synthesized);
        assert_eq!(records[0].uid, "W1");
        assert_eq!(records[0].title, "A");
        assert_eq!(records[0].abstract_text, "x");
        assert_eq!(records[0].fields.get("Year").map(String::as_str), Some("2020"));
    }

    #[test]
    fn test_uid_synthesized_from_row_index() {
        let table = read(b"Article Title,Abstract\nA,x\nB,y\n").unwrap();
        let (records, synthesized) = table.to_records(&ColumnNames::default());
        assert!(synthesized);
        assert_eq!(records[0].uid, "0");
        assert_eq!(records[1].uid, "1");
        assert_eq!(records[1].fields.get("UID").map(String::as_str), Some("1"));
        assert_eq!(records[1].fields.keys().last().map(String::as_str), Some("UID"));
    }

    #[test]
    fn test_read_headers_only() {
        let file = write_bytes(b"\xEF\xBB\xBFUID,title,error\n1,a,\n");
        let headers = read_headers(file.path(), &EventSender::detached()).unwrap();
        assert_eq!(headers, vec!["UID", "title", "error"]);
    }
}
