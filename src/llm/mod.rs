//! LLM completion transport
//!
//! Abstraction over structured-output chat completion plus an
//! OpenAI-compatible implementation.

pub mod client;
pub mod openai;

pub use client::{
    CompletionClient, CompletionRequest, CompletionResponse, FinishReason, JsonSchemaDefinition,
    LlmError, Message, MessageRole, ResponseFormat, TokenUsage,
};
pub use openai::{OpenAiClient, OpenAiConfig};
