//! Pipeline context carried in reserved data fields
//!
//! The engine owns every key starting with `_`. `_pipeline_id` is assigned
//! once per top-level `process` call and propagated verbatim through every
//! downstream invocation; `_retry_attempt` counts Retry loops on the
//! current agent and is cleared when the pipeline moves to a different one.

use crate::schema::DataMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved key carrying the pipeline's process-unique identifier
pub const PIPELINE_ID_KEY: &str = "_pipeline_id";

/// Reserved key carrying the retry attempt counter for the current agent
pub const RETRY_ATTEMPT_KEY: &str = "_retry_attempt";

/// Key under which the LLM router records its reasoning
pub const LLM_REASONING_KEY: &str = "llm_reasoning";

/// Process-wide pipeline ID source. Starts at 1 so IDs are always positive.
static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh pipeline ID.
///
/// Monotonically increasing and race-free under concurrent `process`
/// calls; unique for the lifetime of the process.
pub fn next_pipeline_id() -> u64 {
    NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Read the pipeline ID, if the data already carries one
pub fn pipeline_id_of(data: &DataMap) -> Option<u64> {
    data.get(PIPELINE_ID_KEY).and_then(Value::as_u64)
}

/// Stamp the pipeline ID into the data
pub fn set_pipeline_id(data: &mut DataMap, pipeline_id: u64) {
    data.insert(PIPELINE_ID_KEY.to_string(), Value::from(pipeline_id));
}

/// Read the retry attempt counter; absent counts as 0
pub fn retry_attempt_of(data: &DataMap) -> u32 {
    data.get(RETRY_ATTEMPT_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0) as u32
}

/// Record the retry attempt counter
pub fn set_retry_attempt(data: &mut DataMap, attempt: u32) {
    data.insert(RETRY_ATTEMPT_KEY.to_string(), Value::from(attempt));
}

/// Clear the retry attempt counter as data leaves the current agent
pub fn clear_retry_attempt(data: &mut DataMap) {
    data.remove(RETRY_ATTEMPT_KEY);
}
