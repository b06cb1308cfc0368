//! Mock implementations for testing
//!
//! Provides a scriptable completion client so pipelines with LLM routing
//! can be exercised without network access.

use crate::llm::client::{
    CompletionClient, CompletionRequest, CompletionResponse, FinishReason, LlmError, TokenUsage,
};
use crate::schema::DataMap;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Convert a `json!({..})` object literal into a [`DataMap`].
///
/// # Panics
///
/// Panics if the value is not a JSON object; intended for test fixtures.
pub fn object(value: Value) -> DataMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {other}"),
    }
}

/// Mock completion client with scripted responses
#[derive(Debug)]
pub struct MockCompletionClient {
    responses: Vec<String>,
    current_response: Arc<Mutex<usize>>,
    should_fail: bool,
    received_requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionClient {
    /// Client cycling through the given response contents
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            should_fail: false,
            received_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Client that fails every request with a transport error
    pub fn with_failure() -> Self {
        Self {
            should_fail: true,
            ..Self::new(vec![])
        }
    }

    /// Client that always returns one response
    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Client scripted with serialized route decisions
    pub fn with_decisions(decisions: Vec<Value>) -> Self {
        Self::new(decisions.into_iter().map(|d| d.to_string()).collect())
    }

    /// Requests recorded so far, for assertions on prompts and models
    pub async fn received_requests(&self) -> Vec<CompletionRequest> {
        self.received_requests.lock().await.clone()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.received_requests.lock().await.push(request);

        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: FinishReason::Stop,
        })
    }
}
