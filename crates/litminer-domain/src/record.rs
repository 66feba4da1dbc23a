//! Document records - one row of the source table

use indexmap::IndexMap;
use std::sync::Arc;

/// One input row of the literature table
///
/// Created once when the source table is loaded and never mutated afterwards.
/// `fields` holds every source column in source order (including a synthesized
/// UID column when the source had none), so the record can be written back out
/// unchanged next to the extracted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Stable identifier used as the resume key
    pub uid: String,

    /// Article title; analysis requires it to be non-blank
    pub title: String,

    /// Abstract text, empty when the column is absent or blank
    pub abstract_text: String,

    /// All passthrough columns of the source row, in source order
    pub fields: IndexMap<String, String>,
}

impl DocumentRecord {
    /// Create a record from explicit parts
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        fields: IndexMap<String, String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            fields,
        }
    }

    /// Whether the title is empty or whitespace-only
    pub fn has_blank_title(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Title shortened for log lines
    pub fn title_preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.title.chars().take(max_chars).collect();
        if self.title.chars().count() > max_chars {
            preview.push_str("...");
        }
        preview
    }
}

/// A unit of work handed to the worker pool
///
/// Has no identity beyond its record's UID. The template is shared between
/// all tasks of a run.
#[derive(Debug, Clone)]
pub struct AnalysisTask {
    /// The record to analyze
    pub record: DocumentRecord,

    /// Prompt template containing the content placeholder
    pub template: Arc<str>,

    /// Submission position within the run (0-based)
    pub sequence: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> DocumentRecord {
        DocumentRecord::new("1", title, "", IndexMap::new())
    }

    #[test]
    fn test_blank_title_detection() {
        assert!(record("").has_blank_title());
        assert!(record("   \t\n").has_blank_title());
        assert!(!record("Perovskite stability").has_blank_title());
    }

    #[test]
    fn test_title_preview_truncates_on_char_boundary() {
        let rec = record("钙钛矿太阳能电池的稳定性研究");
        assert_eq!(rec.title_preview(3), "钙钛矿...");
        assert_eq!(record("short").title_preview(60), "short");
    }
}
