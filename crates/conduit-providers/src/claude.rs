//! Anthropic Claude provider adapter. The one concrete external call site
//! in this crate — everything else in `conduit-providers` only ever talks
//! to the `LlmProvider` trait. Request/response shapes are grounded in the
//! real Anthropic Messages API, adapted from the teacher's Claude adapter.

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{LlmProvider, ProviderConfig};
use crate::tier::Tier;
use crate::types::{LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole, StopReason, ToolCall, Usage};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: Client,
    config: ProviderConfig,
    tier: Tier,
    cost_per_token: f64,
    capabilities: Vec<&'static str>,
}

impl ClaudeProvider {
    #[must_use]
    pub fn new(config: ProviderConfig, tier: Tier, cost_per_token: f64, capabilities: Vec<&'static str>) -> Self {
        Self {
            client: Client::new(),
            config,
            tier,
            cost_per_token,
            capabilities,
        }
    }

    fn build_request(&self, messages: &[Message], tools: &[LlmToolDefinition], system: &str) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(Self::convert_message)
            .collect();

        let mut request = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": api_messages,
        });

        if !system.is_empty() {
            request["system"] = Value::String(system.to_string());
        }

        if !tools.is_empty() {
            let api_tools: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect();
            request["tools"] = Value::Array(api_tools);
        }

        request
    }

    fn convert_message(message: &Message) -> Value {
        match &message.content {
            MessageContent::Text(text) => serde_json::json!({
                "role": match message.role {
                    MessageRole::Assistant => "assistant",
                    MessageRole::User | MessageRole::Tool | MessageRole::System => "user",
                },
                "content": text,
            }),
            MessageContent::ToolCalls(calls) => {
                let content: Vec<Value> = calls
                    .iter()
                    .map(|c| {
                        serde_json::json!({
                            "type": "tool_use",
                            "id": c.id,
                            "name": c.name,
                            "input": c.arguments,
                        })
                    })
                    .collect();
                serde_json::json!({ "role": "assistant", "content": content })
            }
            MessageContent::ToolResult(result) => serde_json::json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": result.call_id,
                    "content": result.content,
                    "is_error": result.is_error,
                }],
            }),
        }
    }

    fn parse_response(response: &ApiResponse) -> LlmResponse {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in &response.content {
            match block {
                ContentBlock::Text { text } => text_content.push_str(text),
                ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                }),
            }
        }

        let message = if tool_calls.is_empty() {
            Message::assistant(text_content)
        } else {
            Message {
                role: MessageRole::Assistant,
                content: MessageContent::ToolCalls(tool_calls),
            }
        };

        let stop_reason = match response.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("tool_use") => StopReason::ToolUse,
            _ => StopReason::EndTurn,
        };

        LlmResponse {
            has_tool_calls: matches!(stop_reason, StopReason::ToolUse),
            message,
            stop_reason,
            usage: Usage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "anthropic-claude"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn tier(&self) -> Tier {
        self.tier
    }

    async fn complete(&self, messages: &[Message], tools: &[LlmToolDefinition], system: &str) -> ProviderResult<LlmResponse> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::ApiKeyNotConfigured {
                provider: "claude".to_string(),
            });
        }

        let request_body = self.build_request(messages, tools, system);
        let url = self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL);

        debug!(model = self.config.model, "calling Claude API");

        let mut api_key_header = reqwest::header::HeaderValue::try_from(&self.config.api_key)
            .map_err(|e| ProviderError::ApiRequestFailed(format!("invalid API key characters: {e}")))?;
        api_key_header.set_sensitive(true);

        let response = self
            .client
            .post(url)
            .header("x-api-key", api_key_header)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Claude API error");

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimitExceeded { retry_after_secs: 60 });
            }
            return Err(ProviderError::ApiRequestFailed(format!("status {status}: {body}")));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(Self::parse_response(&parsed))
    }

    fn max_context_length(&self) -> usize {
        self.config.context_window.unwrap_or(200_000)
    }

    fn cost_per_token(&self) -> f64 {
        self.cost_per_token
    }

    fn capabilities(&self) -> &[&'static str] {
        &self.capabilities
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
}
