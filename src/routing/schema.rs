//! Structured output schema for routing decisions
//!
//! The LLM must reply with this exact shape. The schema is passed to the
//! completion client as a declared response schema so backends with strict
//! structured output cannot return anything else.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The decision shape the LLM must return
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RouteDecision {
    /// Chosen outcome; must case-exactly match a declared outcome name
    pub outcome: String,

    /// Reasoning for the decision (for observability and debugging)
    pub reasoning: String,

    /// Optional free-form hint about the next step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

impl RouteDecision {
    /// Validate that the decision is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the outcome or reasoning field is empty.
    pub fn validate(&self) -> Result<(), String> {
        if self.outcome.trim().is_empty() {
            return Err("outcome must not be empty".to_string());
        }
        if self.reasoning.trim().is_empty() {
            return Err("reasoning must not be empty".to_string());
        }
        Ok(())
    }

    /// Generate the JSON schema for this structure
    ///
    /// Passed to the completion client as the declared response schema.
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(RouteDecision);
        serde_json::to_value(schema).expect("Schema should be serializable")
    }
}
