//! Litminer Pipeline
//!
//! Concurrent batch mining of a literature table with an LLM.
//!
//! # Overview
//!
//! A run reads a CSV of articles, sends each title and abstract to an
//! [`LlmClient`](litminer_domain::LlmClient) through a bounded worker pool,
//! flattens the JSON that comes back into columns, and appends the rows to
//! an output CSV in periodic checkpoints. Failed records become rows with an
//! `error` column instead of stopping the run. Re-running with `resume`
//! skips every UID already present in the output.
//!
//! # Architecture
//!
//! ```text
//! CSV → Table → ResumeSet filter → WorkerPool → flatten → CsvSink
//!                                      ↓
//!                                  LlmClient
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use litminer_domain::event_channel;
//! use litminer_llm::MockClient;
//! use litminer_pipeline::{Orchestrator, PipelineConfig, RunRequest, StopFlag};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let (events, _rx) = event_channel();
//! let client = Arc::new(MockClient::new(r#"{"material": "TiO2"}"#));
//! let orchestrator = Orchestrator::new(client, PipelineConfig::default(), events);
//!
//! let report = orchestrator
//!     .run(
//!         RunRequest {
//!             input: "articles.csv".into(),
//!             output: "results.csv".into(),
//!             prompt_template: "Extract materials.\n{content_to_analyze}".into(),
//!             process_limit: 0,
//!             resume: true,
//!         },
//!         StopFlag::new(),
//!     )
//!     .await;
//!
//! println!("{}", report.summary());
//! # }
//! ```

#![warn(missing_docs)]

mod error;

pub mod cancel;
pub mod config;
pub mod flatten;
pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod resume;
pub mod row;
pub mod sink;
pub mod source;
pub mod worker;

pub use cancel::StopFlag;
pub use config::{ColumnNames, PipelineConfig};
pub use error::{ConfigError, PipelineError, SinkError, TableError};
pub use flatten::{cell_text, flatten, flatten_with};
pub use orchestrator::{Orchestrator, RunRequest};
pub use prompt::{analyze_document, compose_content, render_template, CONTENT_PLACEHOLDER};
pub use report::{RunReport, RunStatus};
pub use resume::ResumeSet;
pub use row::{build_output_row, OutputRow};
pub use sink::CsvSink;
pub use source::{read_table, validate_required_columns, ReaderOptions, Table};
