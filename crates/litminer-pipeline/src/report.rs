//! Run reporting

use litminer_domain::RunId;
use std::fmt;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Every selected record was processed
    Completed,
    /// A stop was requested; completed outcomes were saved
    Cancelled,
    /// Every record was already in the output
    NothingToDo,
    /// The run could not start or died unexpectedly
    Failed(String),
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::NothingToDo => write!(f, "nothing to do"),
            RunStatus::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,
    /// Final status
    pub status: RunStatus,
    /// Records in the source table
    pub source_records: usize,
    /// Records skipped because the output already had them
    pub skipped_resume: usize,
    /// Records selected for this run
    pub selected: usize,
    /// Tasks handed to the worker pool
    pub submitted: usize,
    /// Outcomes merged into output rows
    pub processed: usize,
    /// Outcomes that were failures
    pub failed: usize,
    /// Successful flushes to the output
    pub flushes: usize,
    /// Rows that could not be written when the run ended
    pub unsaved: usize,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl RunReport {
    /// Empty report for a fresh run
    pub fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            status: RunStatus::Completed,
            source_records: 0,
            skipped_resume: 0,
            selected: 0,
            submitted: 0,
            processed: 0,
            failed: 0,
            flushes: 0,
            unsaved: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Outcomes that succeeded
    pub fn succeeded(&self) -> usize {
        self.processed.saturating_sub(self.failed)
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Run {} {}", self.run_id.short(), self.status),
            format!("Source records: {}", self.source_records),
            format!("Skipped (already in output): {}", self.skipped_resume),
            format!("Selected: {}", self.selected),
            format!("Submitted: {}", self.submitted),
            format!("Processed: {} ({} ok, {} failed)", self.processed, self.succeeded(), self.failed),
            format!("Saves: {}", self.flushes),
            format!("Elapsed: {:.1}s", self.elapsed.as_secs_f64()),
        ];
        if self.unsaved > 0 {
            lines.push(format!("UNSAVED rows: {}", self.unsaved));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_count() {
        let mut report = RunReport::new(RunId::new());
        report.processed = 10;
        report.failed = 3;
        assert_eq!(report.succeeded(), 7);
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport::new(RunId::new());
        report.status = RunStatus::Cancelled;
        report.processed = 4;
        report.failed = 1;
        report.flushes = 2;
        report.elapsed = Duration::from_millis(1500);

        let summary = report.summary();
        assert!(summary.contains("cancelled"));
        assert!(summary.contains("Processed: 4 (3 ok, 1 failed)"));
        assert!(summary.contains("Saves: 2"));
        assert!(summary.contains("Elapsed: 1.5s"));
        assert!(!summary.contains("UNSAVED"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RunStatus::Failed("no input".into()).to_string(), "failed: no input");
        assert_eq!(RunStatus::NothingToDo.to_string(), "nothing to do");
    }
}
