//! LLM-based outcome router
//!
//! Builds a routing prompt from the agent's configured prompt, its declared
//! outcomes, and the current data, then asks the completion client for a
//! structured [`RouteDecision`]. The returned outcome string is matched
//! case-exactly against the declared outcome names; any mismatch is an
//! `LlmRouter` error the worker absorbs.

use crate::agent::definition::{AgentDefinition, LlmRoutingConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::llm::client::{
    CompletionClient, CompletionRequest, JsonSchemaDefinition, Message, ResponseFormat,
};
use crate::pipeline::context::LLM_REASONING_KEY;
use crate::routing::schema::RouteDecision;
use crate::schema::DataMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Temperature for routing decisions, kept low for consistency
const ROUTING_TEMPERATURE: f32 = 0.1;

/// Cap on routing reply length
const ROUTING_MAX_TOKENS: u32 = 500;

/// A routing decision applied to the pipeline
#[derive(Debug, Clone)]
pub struct RoutedOutcome {
    /// The declared outcome name the LLM picked
    pub outcome: String,
    /// The agent's output data with `llm_reasoning` added
    pub data: DataMap,
}

/// Router that overrides handler-chosen outcomes via an LLM
pub struct LlmRouter {
    client: Arc<dyn CompletionClient>,
}

impl LlmRouter {
    /// Create a new router over a completion client
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Ask the LLM to pick an outcome for `agent` given its current output.
    ///
    /// Never mutates `data` destructively: the returned data is a copy with
    /// the decision's reasoning added under `llm_reasoning`.
    pub async fn route(
        &self,
        agent: &AgentDefinition,
        config: &LlmRoutingConfig,
        data: &DataMap,
    ) -> PipelineResult<RoutedOutcome> {
        let request = Self::build_completion_request(agent, config, data);

        debug!(
            agent = %agent.name(),
            model = %config.model,
            "requesting LLM routing decision"
        );

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(|e| PipelineError::llm_router(e.to_string()))?;

        let content = response
            .content
            .ok_or_else(|| PipelineError::llm_router("no content in LLM response"))?;

        let decision: RouteDecision = serde_json::from_str(&content).map_err(|e| {
            warn!(error = %e, response = %content, "failed to parse routing decision");
            PipelineError::llm_router(format!("failed to parse routing decision: {e}"))
        })?;

        decision
            .validate()
            .map_err(|e| PipelineError::llm_router(format!("invalid routing decision: {e}")))?;

        Self::apply_decision(agent, decision, data)
    }

    /// Build the completion request with the declared response schema
    fn build_completion_request(
        agent: &AgentDefinition,
        config: &LlmRoutingConfig,
        data: &DataMap,
    ) -> CompletionRequest {
        CompletionRequest {
            model: config.model.clone(),
            messages: vec![
                Message::system(
                    "You are a pipeline routing assistant. Pick exactly one of the declared \
                     outcomes for the current agent.",
                ),
                Message::user(Self::build_routing_prompt(agent, config, data)),
            ],
            max_tokens: Some(ROUTING_MAX_TOKENS),
            temperature: Some(ROUTING_TEMPERATURE),
            response_format: Some(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaDefinition {
                    name: "route_decision".to_string(),
                    strict: Some(true),
                    schema: RouteDecision::json_schema(),
                },
            }),
        }
    }

    /// Format the declared outcomes, one per line in declaration order
    fn format_outcomes(agent: &AgentDefinition) -> String {
        let mut output = String::from("POSSIBLE OUTCOMES:\n");
        for outcome in agent.outcomes() {
            match outcome.description() {
                Some(description) => {
                    output.push_str(&format!("- {}: {}\n", outcome.name(), description))
                }
                None => output.push_str(&format!("- {}\n", outcome.name())),
            }
        }
        output
    }

    /// Build the routing prompt for the LLM
    fn build_routing_prompt(
        agent: &AgentDefinition,
        config: &LlmRoutingConfig,
        data: &DataMap,
    ) -> String {
        let outcome_names: Vec<&str> = agent.outcomes().iter().map(|o| o.name()).collect();
        let data_dump = serde_json::to_string_pretty(&Value::Object(data.clone()))
            .unwrap_or_else(|_| "{}".to_string());

        format!(
            "{}\n\n{}\nCURRENT DATA:\n{}\n\nDecide which outcome to take next. \
             The \"outcome\" field of your reply must be exactly one of: {}.",
            config.prompt,
            Self::format_outcomes(agent),
            data_dump,
            outcome_names.join(", ")
        )
    }

    /// Match the decision against the declared outcomes and merge reasoning
    fn apply_decision(
        agent: &AgentDefinition,
        decision: RouteDecision,
        data: &DataMap,
    ) -> PipelineResult<RoutedOutcome> {
        let matched = agent.find_outcome(&decision.outcome).ok_or_else(|| {
            warn!(
                agent = %agent.name(),
                outcome = %decision.outcome,
                "LLM returned undeclared outcome"
            );
            PipelineError::llm_router(format!(
                "LLM chose undeclared outcome '{}'",
                decision.outcome
            ))
        })?;

        info!(
            agent = %agent.name(),
            outcome = %matched.name(),
            reasoning = %decision.reasoning,
            "LLM routing decision"
        );

        let mut data = data.clone();
        data.insert(
            LLM_REASONING_KEY.to_string(),
            Value::String(decision.reasoning),
        );

        Ok(RoutedOutcome {
            outcome: matched.name().to_string(),
            data,
        })
    }
}
