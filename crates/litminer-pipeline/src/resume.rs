//! Resume-set computation

use crate::source::{read_table, ReaderOptions};
use litminer_domain::EventSender;
use std::collections::HashSet;
use std::path::Path;

/// UIDs already present in an existing output file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeSet {
    uids: HashSet<String>,
}

impl ResumeSet {
    /// An empty set; every record is processed
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `uid` was already processed
    pub fn contains(&self, uid: &str) -> bool {
        self.uids.contains(uid)
    }

    /// Number of distinct processed UIDs
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// Whether nothing was processed yet
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Load the UIDs from an existing sink
    ///
    /// A missing file yields an empty set. An unreadable file or one without
    /// the UID column is logged as a warning and also yields an empty set.
    pub fn load(output: &Path, uid_column: &str, options: &ReaderOptions, events: &EventSender) -> Self {
        if !output.exists() {
            return Self::empty();
        }

        let table = match read_table(output, options, events) {
            Ok(table) => table,
            Err(e) => {
                events.warn(format!("Could not read output file for resume check: {}", e));
                return Self::empty();
            }
        };

        let Some(values) = table.column_values(uid_column) else {
            events.warn(format!(
                "Output file has no '{}' column; resume check skipped",
                uid_column
            ));
            return Self::empty();
        };

        let set: Self = values
            .into_iter()
            .filter(|uid| !uid.trim().is_empty())
            .map(str::to_string)
            .collect();
        events.info(format!(
            "Resume mode: found {} processed records in the output file",
            set.len()
        ));
        set
    }
}

impl FromIterator<String> for ResumeSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            uids: iter.into_iter().collect(),
        }
    }
}
