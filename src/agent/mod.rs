//! Agent definitions and the registry that resolves them
//!
//! An agent is a static description: typed input/output schemas, an ordered
//! set of named outcomes mapped to routing rules, a task handler, and an
//! optional LLM routing configuration. Definitions are built once at
//! startup and never mutated during execution.

pub mod definition;
pub mod registry;

pub use definition::{
    handler_fn, AgentBuilder, AgentDefinition, AgentHandler, LlmRoutingConfig, Outcome,
    RoutingRule, TaskError, TaskOutput,
};
pub use registry::AgentRegistry;
