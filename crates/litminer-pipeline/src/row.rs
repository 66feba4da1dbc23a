//! Output rows

use crate::flatten::{cell_text, flatten};
use indexmap::IndexMap;
use litminer_domain::{AnalysisResult, DocumentRecord};
use serde_json::Value;

/// Column holding the failure label of a failed record
pub const ERROR_COLUMN: &str = "error";

/// Column holding the model's raw answer when it could not be parsed
pub const RAW_CONTENT_COLUMN: &str = "raw_content";

/// One output line: column name to cell text, in column order
pub type OutputRow = IndexMap<String, String>;

/// Merge a record with its analysis outcome
///
/// Extracted fields overwrite source columns of the same name; a failure
/// adds the `error` column (and `raw_content` for unparseable answers).
pub fn build_output_row(record: &DocumentRecord, result: &AnalysisResult) -> OutputRow {
    let mut row = record.fields.clone();
    match result {
        Ok(fields) => {
            for (key, value) in flatten(&Value::Object(fields.clone())) {
                row.insert(key, cell_text(&value));
            }
        }
        Err(failure) => {
            row.insert(ERROR_COLUMN.to_string(), failure.label());
            if let Some(raw) = failure.raw_content() {
                row.insert(RAW_CONTENT_COLUMN.to_string(), raw.to_string());
            }
        }
    }
    row
}
