//! OpenAI-compatible completion client
//!
//! Speaks the `chat/completions` wire format with `json_schema` structured
//! output. The base URL is configurable so the same client covers
//! self-hosted gateways and test servers.

use crate::config::FrameworkConfig;
use crate::error::sanitize_error_message;
use crate::llm::client::{
    CompletionClient, CompletionRequest, CompletionResponse, FinishReason, LlmError, Message,
    MessageRole, ResponseFormat, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

/// OpenAI client configuration
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI-compatible completion client
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Build a client from the framework configuration.
    ///
    /// The API key is resolved from the configured environment variable at
    /// this point, not at config load time.
    pub fn from_config(config: &FrameworkConfig) -> Result<Self, LlmError> {
        let api_key = config
            .llm_api_key()
            .map_err(|e| LlmError::NotConfigured(e.to_string()))?;

        let mut openai_config = OpenAiConfig {
            api_key,
            timeout: config.llm_timeout(),
            ..Default::default()
        };
        if let Some(base_url) = &config.llm.base_url {
            openai_config.base_url = base_url.clone();
        }

        Self::new(openai_config)
    }

    /// Convert a completion request to the wire format (pure function)
    fn convert_request(request: &CompletionRequest) -> WireCompletionRequest {
        let response_format = request.response_format.as_ref().map(|rf| match rf {
            ResponseFormat::Text => WireResponseFormat::Simple {
                format_type: "text".to_string(),
            },
            ResponseFormat::JsonSchema { json_schema } => WireResponseFormat::JsonSchema {
                format_type: "json_schema".to_string(),
                json_schema: WireJsonSchema {
                    name: json_schema.name.clone(),
                    strict: json_schema.strict,
                    schema: json_schema.schema.clone(),
                },
            },
        });

        WireCompletionRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format,
        }
    }

    fn convert_message(message: &Message) -> WireMessage {
        WireMessage {
            role: match message.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: Some(message.content.clone()),
        }
    }

    /// Parse a wire response (pure function)
    fn parse_response(wire: WireCompletionResponse) -> Result<CompletionResponse, LlmError> {
        let choice = wire
            .choices
            .first()
            .ok_or_else(|| LlmError::ApiError("No choices returned".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: wire.model,
            usage: TokenUsage {
                prompt_tokens: wire.usage.prompt_tokens,
                completion_tokens: wire.usage.completion_tokens,
                total_tokens: wire.usage.total_tokens,
            },
            finish_reason: Self::convert_finish_reason(choice.finish_reason.as_deref()),
        })
    }

    fn convert_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        }
    }

    /// Whether a failed request is worth retrying (pure)
    fn should_retry(error: &LlmError) -> bool {
        match error {
            LlmError::NetworkError(_) => true,
            LlmError::ApiError(msg) => msg.contains("server error"),
            _ => false,
        }
    }

    /// Retry orchestrator around the single-request I/O path
    async fn complete_with_retry(
        &self,
        wire_request: WireCompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let backoff_delays = [100u64, 200, 300];
        let mut last_error = None;

        for (attempt, &delay_ms) in std::iter::once(&0u64)
            .chain(backoff_delays.iter())
            .enumerate()
        {
            if attempt > 0 {
                debug!("completion retry attempt {} after {}ms", attempt, delay_ms);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.make_api_request(&wire_request).await {
                Ok(wire_response) => {
                    let response = Self::parse_response(wire_response)?;
                    debug!(
                        total_tokens = response.usage.total_tokens,
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        "completion succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!("completion attempt {} failed: {}", attempt + 1, e);
                    if !Self::should_retry(&e) {
                        error!("non-retryable completion error, aborting: {}", e);
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        error!("completion request failed after all retries");
        Err(last_error
            .unwrap_or_else(|| LlmError::NetworkError("All retry attempts failed".to_string())))
    }

    /// Single API request (impure I/O)
    async fn make_api_request(
        &self,
        wire_request: &WireCompletionRequest,
    ) -> Result<WireCompletionResponse, LlmError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(wire_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(sanitize_error_message(&e.to_string())))?;

        let status = response.status();

        if status.is_server_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(sanitize_error_message(&format!(
                "completion API server error: {status} - {error_text}"
            ))));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(sanitize_error_message(&format!(
                "completion API error: {status} - {error_text}"
            ))));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat_completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let wire_request = Self::convert_request(&request);
        debug!(
            model = %wire_request.model,
            messages = wire_request.messages.len(),
            structured = wire_request.response_format.is_some(),
            "sending completion request"
        );
        self.complete_with_retry(wire_request).await
    }
}

#[derive(Debug, Serialize)]
struct WireCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCompletionResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireResponseFormat {
    Simple {
        #[serde(rename = "type")]
        format_type: String,
    },
    JsonSchema {
        #[serde(rename = "type")]
        format_type: String,
        json_schema: WireJsonSchema,
    },
}

#[derive(Debug, Serialize)]
struct WireJsonSchema {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    strict: Option<bool>,
    schema: serde_json::Value,
}
