//! Litminer Domain Layer
//!
//! Core data model and trait boundaries for the literature mining pipeline.
//! Infrastructure (HTTP clients, CSV I/O, the worker pool) lives in other
//! crates and depends on the types defined here.
//!
//! ## Key Concepts
//!
//! - **DocumentRecord**: One row of the source table (UID, title, abstract, passthrough columns)
//! - **AnalysisResult**: Extracted fields, or a tagged [`TaskFailure`]
//! - **LlmClient**: The "analyze text → structured result" capability
//! - **Events**: The one-way progress/log channel from the pipeline to its consumer
//!
//! ## Architecture
//!
//! - Pure data types plus trait definitions
//! - No I/O beyond the in-process event channel
//! - Every component that reports status receives an [`EventSender`] explicitly

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod events;
pub mod record;
pub mod result;
pub mod run;
pub mod traits;

// Re-exports for convenience
pub use events::{event_channel, EventReceiver, EventSender, LogLevel, PipelineEvent};
pub use record::{AnalysisTask, DocumentRecord};
pub use result::{AnalysisResult, ExtractedFields, MalformedReason, SamplingParams, TaskFailure};
pub use run::RunId;
pub use traits::LlmClient;
