//! Static agent descriptions
//!
//! `AgentDefinition` is the declarative unit the worker consults at
//! runtime. Outcomes keep declaration order; routing targets are agent
//! names resolved against the registry at routing time, so self-loops and
//! cyclic graphs need no special construction order.

use crate::error::{PipelineError, PipelineResult};
use crate::schema::{DataMap, Schema};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Default model for LLM routing decisions
const DEFAULT_ROUTING_MODEL: &str = "gpt-4o-mini";

/// How an outcome routes the pipeline onward
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingRule {
    /// Hand the data to another agent (may be the same agent for
    /// self-loop patterns)
    Forward { to: String },
    /// Loop back to the same agent, bounded by `max_attempts` or the
    /// framework default when unset
    Retry { max_attempts: Option<u32> },
    /// End the pipeline and return `(outcome, data)` to the caller
    Terminal,
}

/// A named result branch of an agent
#[derive(Debug, Clone)]
pub struct Outcome {
    name: String,
    routing: RoutingRule,
    description: Option<String>,
}

impl Outcome {
    /// Declare an outcome that forwards to another agent
    pub fn forward(name: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing: RoutingRule::Forward { to: to.into() },
            description: None,
        }
    }

    /// Declare a bounded retry outcome
    pub fn retry(name: impl Into<String>, max_attempts: Option<u32>) -> Self {
        Self {
            name: name.into(),
            routing: RoutingRule::Retry { max_attempts },
            description: None,
        }
    }

    /// Declare a terminal outcome
    pub fn terminal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            routing: RoutingRule::Terminal,
            description: None,
        }
    }

    /// Attach a description, surfaced to the LLM router
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routing(&self) -> &RoutingRule {
        &self.routing
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// LLM routing configuration for one agent
#[derive(Debug, Clone)]
pub struct LlmRoutingConfig {
    pub model: String,
    pub prompt: String,
}

impl LlmRoutingConfig {
    /// Configuration with the default routing model
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_ROUTING_MODEL.to_string(),
            prompt: prompt.into(),
        }
    }

    /// Override the routing model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Result of one task handler invocation
#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub outcome: String,
    pub data: DataMap,
}

impl TaskOutput {
    pub fn new(outcome: impl Into<String>, data: DataMap) -> Self {
        Self {
            outcome: outcome.into(),
            data,
        }
    }
}

/// Error value returned by a task handler
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    pub message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User task code: consumes validated, default-merged input and picks an
/// outcome by name.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    async fn handle_task(&self, input: DataMap) -> Result<TaskOutput, TaskError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F> AgentHandler for FnHandler<F>
where
    F: Fn(DataMap) -> Result<TaskOutput, TaskError> + Send + Sync,
{
    async fn handle_task(&self, input: DataMap) -> Result<TaskOutput, TaskError> {
        (self.0)(input)
    }
}

/// Wrap a plain closure as an [`AgentHandler`]
pub fn handler_fn<F>(f: F) -> Arc<dyn AgentHandler>
where
    F: Fn(DataMap) -> Result<TaskOutput, TaskError> + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// The static description of one agent
#[derive(Clone)]
pub struct AgentDefinition {
    name: String,
    input_schema: Schema,
    output_schema: Schema,
    outcomes: Vec<Outcome>,
    handler: Arc<dyn AgentHandler>,
    llm_routing: Option<LlmRoutingConfig>,
}

impl fmt::Debug for AgentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentDefinition")
            .field("name", &self.name)
            .field("outcomes", &self.outcomes)
            .field("llm_routing", &self.llm_routing)
            .finish_non_exhaustive()
    }
}

impl AgentDefinition {
    /// Start building an agent definition
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            name: name.into(),
            input_schema: Schema::empty(),
            output_schema: Schema::empty(),
            outcomes: Vec::new(),
            handler: None,
            llm_routing: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    /// Declared outcomes in declaration order
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn llm_routing(&self) -> Option<&LlmRoutingConfig> {
        self.llm_routing.as_ref()
    }

    /// Find an outcome by name, preserving declaration order for lookups
    pub fn find_outcome(&self, name: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.name() == name)
    }

    /// Run the agent's task handler
    pub async fn handle_task(&self, input: DataMap) -> Result<TaskOutput, TaskError> {
        self.handler.handle_task(input).await
    }
}

/// Builder for [`AgentDefinition`]
pub struct AgentBuilder {
    name: String,
    input_schema: Schema,
    output_schema: Schema,
    outcomes: Vec<Outcome>,
    handler: Option<Arc<dyn AgentHandler>>,
    llm_routing: Option<LlmRoutingConfig>,
}

impl AgentBuilder {
    pub fn input_schema(mut self, schema: Schema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn output_schema(mut self, schema: Schema) -> Self {
        self.output_schema = schema;
        self
    }

    /// Append an outcome; declaration order is preserved
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcomes.push(outcome);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn AgentHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Convenience for plain closure handlers
    pub fn handler_fn<F>(self, f: F) -> Self
    where
        F: Fn(DataMap) -> Result<TaskOutput, TaskError> + Send + Sync + 'static,
    {
        self.handler(handler_fn(f))
    }

    pub fn llm_routing(mut self, config: LlmRoutingConfig) -> Self {
        self.llm_routing = Some(config);
        self
    }

    /// Finish the definition, enforcing load-time invariants
    pub fn build(self) -> PipelineResult<AgentDefinition> {
        if self.name.is_empty() {
            return Err(PipelineError::definition("agent name must not be empty"));
        }
        if self.outcomes.is_empty() {
            return Err(PipelineError::definition(format!(
                "agent '{}' declares no outcomes",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for outcome in &self.outcomes {
            if !seen.insert(outcome.name().to_string()) {
                return Err(PipelineError::definition(format!(
                    "agent '{}' declares duplicate outcome '{}'",
                    self.name,
                    outcome.name()
                )));
            }
            if let RoutingRule::Forward { to } = outcome.routing() {
                if to.is_empty() {
                    return Err(PipelineError::definition(format!(
                        "outcome '{}' of agent '{}' forwards to an empty target",
                        outcome.name(),
                        self.name
                    )));
                }
            }
        }

        let handler = self.handler.ok_or_else(|| {
            PipelineError::definition(format!("agent '{}' has no task handler", self.name))
        })?;

        Ok(AgentDefinition {
            name: self.name,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
            outcomes: self.outcomes,
            handler,
            llm_routing: self.llm_routing,
        })
    }
}
