//! Fixed-size worker pool
//!
//! Workers share one task queue. Each worker takes a task, runs it to
//! completion, and sends the outcome to the collector. A stop request is
//! honored between tasks: queued tasks are abandoned, the call in flight is
//! allowed to finish.

use crate::cancel::StopFlag;
use crate::prompt::analyze_document;
use litminer_domain::{AnalysisResult, AnalysisTask, DocumentRecord, EventSender, LlmClient, SamplingParams, TaskFailure};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinHandle};

/// A finished task
#[derive(Debug)]
pub struct TaskOutcome {
    /// The record that was analyzed
    pub record: DocumentRecord,
    /// Submission position
    pub sequence: usize,
    /// What came back
    pub result: AnalysisResult,
}

/// Everything a worker needs besides the queue
#[derive(Clone)]
pub struct WorkerContext {
    /// The LLM backend
    pub client: Arc<dyn LlmClient>,
    /// Sampling parameters for every call
    pub params: SamplingParams,
    /// Log channel
    pub events: EventSender,
    /// Shared stop request
    pub stop: StopFlag,
}

/// Running workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `size` workers on `queue`, reporting to `results`
    pub fn spawn(
        size: usize,
        context: WorkerContext,
        queue: mpsc::Receiver<AnalysisTask>,
        results: mpsc::UnboundedSender<TaskOutcome>,
    ) -> Self {
        let queue = Arc::new(Mutex::new(queue));
        let handles = (0..size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&queue),
                    context.clone(),
                    results.clone(),
                ))
            })
            .collect();
        Self { handles }
    }

    /// Number of workers started
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Worker exited abnormally: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<AnalysisTask>>>,
    context: WorkerContext,
    results: mpsc::UnboundedSender<TaskOutcome>,
) {
    tracing::debug!("Worker {} started", id);

    loop {
        let next = {
            let mut queue = queue.lock().await;
            tokio::select! {
                task = queue.recv() => task,
                _ = context.stop.cancelled() => None,
            }
        };

        let Some(task) = next else { break };
        if context.stop.is_stopped() {
            break;
        }

        let outcome = run_task(&context, task).await;
        if results.send(outcome).is_err() {
            // Collector is gone
            break;
        }
    }

    tracing::debug!("Worker {} stopped", id);
}

/// Run one task in its own tokio task so a panic becomes a failure value
async fn run_task(context: &WorkerContext, task: AnalysisTask) -> TaskOutcome {
    let AnalysisTask { record, template, sequence } = task;

    let handle = {
        let client = Arc::clone(&context.client);
        let events = context.events.clone();
        let params = context.params;
        let record = record.clone();
        tokio::spawn(async move {
            analyze_document(client.as_ref(), &template, &record, params, &events).await
        })
    };

    let result = match handle.await {
        Ok(result) => result,
        Err(e) => {
            let message = join_error_message(e);
            context.events.error(format!(
                "Unexpected error while processing UID {}: {}",
                record.uid, message
            ));
            Err(TaskFailure::Unexpected(message))
        }
    };

    TaskOutcome { record, sequence, result }
}

fn join_error_message(error: JoinError) -> String {
    if error.is_panic() {
        panic_message(error.into_panic())
    } else {
        "task was cancelled".to_string()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
