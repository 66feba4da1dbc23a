//! Batch pipeline orchestrator
//!
//! Drives one mining run end to end:
//!
//! ```text
//! source → resume filter → submitter → worker pool → collector → sink
//! ```
//!
//! The submitter and the collector run concurrently. Outcomes are merged in
//! completion order and flushed to the sink every `save_interval` rows.

use crate::cancel::StopFlag;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::report::{RunReport, RunStatus};
use crate::resume::ResumeSet;
use crate::row::{build_output_row, OutputRow};
use crate::sink::CsvSink;
use crate::source::{read_table, validate_required_columns, ReaderOptions};
use crate::worker::{TaskOutcome, WorkerContext, WorkerPool};
use litminer_domain::{AnalysisTask, DocumentRecord, EventSender, LlmClient, RunId};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Inputs of one run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Source CSV
    pub input: PathBuf,
    /// Output CSV (appended to)
    pub output: PathBuf,
    /// Template containing `{content_to_analyze}`
    pub prompt_template: String,
    /// Cap on records processed; 0 means no cap
    pub process_limit: usize,
    /// Skip records whose UID is already in the output
    pub resume: bool,
}

/// Runs mining jobs against one LLM client
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    config: PipelineConfig,
    events: EventSender,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(client: Arc<dyn LlmClient>, config: PipelineConfig, events: EventSender) -> Self {
        Self { client, config, events }
    }

    /// The configuration in effect
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute a run
    ///
    /// Never fails: problems that prevent the run from completing are
    /// reported through the event channel and the returned status.
    pub async fn run(&self, request: RunRequest, stop: StopFlag) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::new(RunId::new());
        self.events.debug(format!(
            "Run {} started with {}",
            report.run_id.short(),
            self.client.describe()
        ));

        report.status = match self.execute(&request, &stop, &mut report).await {
            Ok(status) => status,
            Err(e) => {
                self.events.error(e.to_string());
                RunStatus::Failed(e.to_string())
            }
        };
        report.elapsed = started.elapsed();

        match &report.status {
            RunStatus::Cancelled => self.events.info("Analysis run cancelled."),
            RunStatus::Failed(_) => self.events.error("Analysis run failed."),
            _ => self.events.info("Analysis run finished."),
        }
        report
    }

    async fn execute(
        &self,
        request: &RunRequest,
        stop: &StopFlag,
        report: &mut RunReport,
    ) -> Result<RunStatus, PipelineError> {
        self.config.validate()?;
        let columns = &self.config.columns;
        let options = ReaderOptions {
            strict_fallback: self.config.strict_encoding,
        };

        let table = read_table(&request.input, &options, &self.events)?;
        report.source_records = table.len();
        self.events.info(format!(
            "Loaded {}: {} records",
            request.input.display(),
            table.len()
        ));

        let missing = validate_required_columns(
            &table,
            &[columns.title.as_str(), columns.abstract_text.as_str()],
        );
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns(missing));
        }

        let resume_set = if request.resume {
            ResumeSet::load(&request.output, &columns.uid, &options, &self.events)
        } else {
            ResumeSet::empty()
        };

        let (records, synthesized) = table.to_records(columns);
        drop(table);
        if synthesized {
            self.events.warn(format!(
                "Input file has no '{}' column; row numbers will be used as identifiers and resume may be inaccurate",
                columns.uid
            ));
        }

        let mut selected: Vec<DocumentRecord> = records
            .into_iter()
            .filter(|record| !resume_set.contains(&record.uid))
            .collect();
        report.skipped_resume = report.source_records - selected.len();
        if request.process_limit > 0 {
            selected.truncate(request.process_limit);
        }
        report.selected = selected.len();

        if selected.is_empty() {
            self.events.info("All records have already been processed; nothing to do.");
            return Ok(RunStatus::NothingToDo);
        }
        self.events.info(format!("Processing {} new records", selected.len()));

        let status = self.process(request, selected, stop, report).await?;
        if status == RunStatus::Completed {
            self.events.info(format!(
                "Analysis complete. Results appended to {}",
                request.output.display()
            ));
        }
        Ok(status)
    }

    async fn process(
        &self,
        request: &RunRequest,
        records: Vec<DocumentRecord>,
        stop: &StopFlag,
        report: &mut RunReport,
    ) -> Result<RunStatus, PipelineError> {
        let total = records.len();
        let workers = self.config.max_workers;
        let (task_tx, task_rx) = mpsc::channel(workers);
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();

        let context = WorkerContext {
            client: Arc::clone(&self.client),
            params: self.config.sampling(),
            events: self.events.clone(),
            stop: stop.clone(),
        };
        let pool = WorkerPool::spawn(workers, context, task_rx, result_tx);
        self.events.info(format!("Started {} workers", pool.size()));

        let submitted = Arc::new(AtomicUsize::new(0));
        let submitter = tokio::spawn(submit_tasks(
            records,
            Arc::from(request.prompt_template.as_str()),
            task_tx,
            stop.clone(),
            self.config.submission_delay(),
            Arc::clone(&submitted),
        ));

        let mut sink = CsvSink::new(&request.output, self.events.clone());
        let mut buffer: Vec<OutputRow> = Vec::with_capacity(self.config.save_interval);

        let cancelled = loop {
            if stop.is_stopped() {
                break true;
            }
            tokio::select! {
                _ = stop.cancelled() => break true,
                outcome = result_rx.recv() => match outcome {
                    Some(outcome) => {
                        self.collect(outcome, total, &mut buffer, report);
                        if buffer.len() >= self.config.save_interval {
                            self.flush(&mut sink, &mut buffer, report);
                        }
                    }
                    None => break stop.is_stopped(),
                },
            }
        };

        if cancelled {
            self.events.warn("Stop requested; finishing with the results collected so far");
            while let Ok(outcome) = result_rx.try_recv() {
                self.collect(outcome, total, &mut buffer, report);
            }
        }

        self.flush(&mut sink, &mut buffer, report);
        report.submitted = submitted.load(Ordering::SeqCst);
        if !buffer.is_empty() {
            report.unsaved = buffer.len();
            self.events.error(format!(
                "{} results could not be saved to {}",
                buffer.len(),
                request.output.display()
            ));
        }

        if cancelled {
            return Ok(RunStatus::Cancelled);
        }

        submitter
            .await
            .map_err(|e| PipelineError::Internal(format!("submitter: {}", e)))?;
        pool.join().await;
        report.submitted = submitted.load(Ordering::SeqCst);
        Ok(RunStatus::Completed)
    }

    fn collect(&self, outcome: TaskOutcome, total: usize, buffer: &mut Vec<OutputRow>, report: &mut RunReport) {
        if outcome.result.is_err() {
            report.failed += 1;
        }
        buffer.push(build_output_row(&outcome.record, &outcome.result));
        report.processed += 1;
        self.events.progress(report.processed, total);
    }

    fn flush(&self, sink: &mut CsvSink, buffer: &mut Vec<OutputRow>, report: &mut RunReport) {
        if buffer.is_empty() {
            return;
        }
        self.events.info(format!("Saving {} results...", buffer.len()));
        match sink.append(buffer) {
            Ok(_) => {
                buffer.clear();
                report.flushes += 1;
                self.events.info("Saved.");
            }
            Err(e) => {
                self.events.error(format!("Failed to save results: {}", e));
                self.events.warn(format!(
                    "{} results are held in memory only and are at risk until the next successful save",
                    buffer.len()
                ));
            }
        }
    }
}

/// Feed records to the pool in source order
async fn submit_tasks(
    records: Vec<DocumentRecord>,
    template: Arc<str>,
    queue: mpsc::Sender<AnalysisTask>,
    stop: StopFlag,
    delay: Duration,
    submitted: Arc<AtomicUsize>,
) {
    for (sequence, record) in records.into_iter().enumerate() {
        if stop.is_stopped() {
            break;
        }
        let task = AnalysisTask {
            record,
            template: Arc::clone(&template),
            sequence,
        };
        tokio::select! {
            sent = queue.send(task) => {
                if sent.is_err() {
                    break;
                }
            }
            _ = stop.cancelled() => break,
        }
        submitted.fetch_add(1, Ordering::SeqCst);

        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = stop.cancelled() => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litminer_llm::MockClient;

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            max_workers: 2,
            submission_delay_ms: 0,
            save_interval: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_config_error_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig { max_workers: 0, ..Default::default() };
        let orchestrator = Orchestrator::new(Arc::new(MockClient::new("{}")), config, EventSender::detached());

        let report = orchestrator
            .run(
                RunRequest {
                    input: dir.path().join("in.csv"),
                    output: dir.path().join("out.csv"),
                    prompt_template: "{content_to_analyze}".into(),
                    process_limit: 0,
                    resume: false,
                },
                StopFlag::new(),
            )
            .await;
        assert!(matches!(report.status, RunStatus::Failed(msg) if msg.contains("max_workers")));
    }

    #[tokio::test]
    async fn test_submitter_stops_on_flag() {
        let stop = StopFlag::new();
        stop.stop();
        let (tx, mut rx) = mpsc::channel(8);
        let submitted = Arc::new(AtomicUsize::new(0));
        let records = vec![DocumentRecord::new("1", "t", "", Default::default())];

        submit_tasks(records, Arc::from("x"), tx, stop, Duration::ZERO, Arc::clone(&submitted)).await;

        assert_eq!(submitted.load(Ordering::SeqCst), 0);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_small_run_completes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "UID,Article Title,Abstract\n1,A,x\n2,B,y\n3,C,z\n").unwrap();

        let client = Arc::new(MockClient::new(r#"{"material": "Si"}"#));
        let orchestrator = Orchestrator::new(client.clone(), fast_config(), EventSender::detached());
        let report = orchestrator
            .run(
                RunRequest {
                    input,
                    output: dir.path().join("out.csv"),
                    prompt_template: "{content_to_analyze}".into(),
                    process_limit: 0,
                    resume: false,
                },
                StopFlag::new(),
            )
            .await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.submitted, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.flushes, 2);
        assert_eq!(client.call_count(), 3);
    }
}
