//! Pipeline execution
//!
//! A worker drives one whole pipeline run as an iterative loop over agent
//! invocations; the supervisor spawns one isolated worker per top-level
//! `process` call and observes it for crashes.

pub mod context;
pub mod supervisor;
pub mod worker;

pub use context::{LLM_REASONING_KEY, PIPELINE_ID_KEY, RETRY_ATTEMPT_KEY};
pub use supervisor::{PipelineHandle, Supervisor};
pub use worker::{calculate_retry_delay, PipelineOutput};
