//! agentflow - autonomous agent pipelines
//!
//! A framework for composing pipelines of small processing units
//! ("agents"), each with typed input/output schemas and a fixed set of
//! named outcomes that route the computation onward: forward to another
//! agent, loop back for a bounded retry, or terminate the pipeline.
//! Optionally an outcome is chosen by an LLM router instead of the agent's
//! own code.
//!
//! # Quick Start
//!
//! ```rust
//! use agentflow::{
//!     AgentDefinition, AgentRegistry, Field, FieldType, FrameworkConfig, Outcome, Schema,
//!     Supervisor, TaskOutput,
//! };
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), agentflow::PipelineError> {
//! let registry = AgentRegistry::new();
//!
//! registry.register(
//!     AgentDefinition::builder("greeter")
//!         .input_schema(Schema::new(vec![
//!             Field::required("name", FieldType::String),
//!             Field::optional("language", FieldType::String).with_default(json!("en")),
//!         ]).expect("valid schema"))
//!         .outcome(Outcome::terminal("greeted"))
//!         .handler_fn(|input| {
//!             let name = input["name"].as_str().unwrap_or("stranger");
//!             let mut data = agentflow::testing::object(json!({
//!                 "greeting": format!("Hello {name}"),
//!             }));
//!             data.extend(input);
//!             Ok(TaskOutput::new("greeted", data))
//!         })
//!         .build()?,
//! );
//!
//! let supervisor = Supervisor::new(registry, FrameworkConfig::default());
//! let result = supervisor
//!     .process("greeter", agentflow::testing::object(json!({"name": "Maria"})))
//!     .await?;
//!
//! assert_eq!(result.outcome, "greeted");
//! assert!(result.data.contains_key("_pipeline_id"));
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod routing;
pub mod schema;
pub mod testing;

pub use agent::{
    handler_fn, AgentBuilder, AgentDefinition, AgentHandler, AgentRegistry, LlmRoutingConfig,
    Outcome, RoutingRule, TaskError, TaskOutput,
};
pub use config::{BackoffStrategy, ConfigError, FrameworkConfig, LogLevel};
pub use error::{PipelineError, PipelineResult};
pub use llm::{CompletionClient, OpenAiClient, OpenAiConfig};
pub use pipeline::{
    calculate_retry_delay, PipelineHandle, PipelineOutput, Supervisor, LLM_REASONING_KEY,
    PIPELINE_ID_KEY, RETRY_ATTEMPT_KEY,
};
pub use routing::{LlmRouter, RouteDecision};
pub use schema::{DataMap, Field, FieldType, Schema, SchemaError};
