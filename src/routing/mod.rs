//! LLM-based outcome routing
//!
//! When an agent declares an LLM routing configuration, the router asks a
//! language model to pick one of the agent's declared outcome names. The
//! worker treats router failures as non-fatal and keeps the outcome chosen
//! by the agent's own task handler.

pub mod llm_router;
pub mod schema;

pub use llm_router::{LlmRouter, RoutedOutcome};
pub use schema::RouteDecision;
