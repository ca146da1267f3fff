//! Simple Tool Frame (spec §4.6): one-shot request -> provider call ->
//! response. Grounded in the dispatch shape of the teacher's
//! `tool_execution.rs::execute_builtin_tool` (schema check, call, truncate),
//! generalised to route through the provider registry instead of an MCP
//! client.

use crate::envelope::FrameEnvelope;
use crate::error::{RuntimeError, RuntimeResult};
use crate::schema::validate_arguments;
use conduit_continuity::{prepend_within_budget, ConversationStore, Turn, TurnRole};
use conduit_core::ContinuationId;
use conduit_providers::routing::RoutingRequest;
use conduit_providers::types::Message;
use conduit_providers::ProviderRegistry;
use conduit_tools::{Capability, ToolDescriptor};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn capability_str(cap: Capability) -> &'static str {
    match cap {
        Capability::Vision => "vision",
        Capability::LongContext => "long_context",
        Capability::Tools => "tools",
        Capability::WebSearch => "web_search",
    }
}

fn to_routing_category(category: conduit_tools::ToolCategory) -> conduit_providers::ToolCategory {
    match category {
        conduit_tools::ToolCategory::Simple => conduit_providers::ToolCategory::Simple,
        conduit_tools::ToolCategory::Workflow => conduit_providers::ToolCategory::Workflow,
        conduit_tools::ToolCategory::Utility => conduit_providers::ToolCategory::Utility,
    }
}

fn turn_to_message(turn: &Turn) -> Message {
    match turn.role {
        TurnRole::User => Message::user(turn.content.clone()),
        TurnRole::Assistant => Message::assistant(turn.content.clone()),
        // A tool turn replayed as history becomes plain user-visible context;
        // the provider never sees a synthetic tool_call_id for it.
        TurnRole::Tool => Message::user(turn.content.clone()),
    }
}

pub struct SimpleRequest<'a> {
    pub descriptor: &'a ToolDescriptor,
    pub arguments: Value,
    pub continuation_id: Option<ContinuationId>,
    pub explicit_model: Option<&'a str>,
    pub file_count: usize,
    pub complexity_hint: Option<f64>,
}

pub struct SimpleToolFrame {
    providers: Arc<ProviderRegistry>,
    continuity: Arc<ConversationStore>,
    long_context_threshold: usize,
    complexity_threshold: f64,
    context_budget_tokens: usize,
}

impl SimpleToolFrame {
    pub fn new(
        providers: Arc<ProviderRegistry>,
        continuity: Arc<ConversationStore>,
        long_context_threshold: usize,
        complexity_threshold: f64,
        context_budget_tokens: usize,
    ) -> Self {
        Self {
            providers,
            continuity,
            long_context_threshold,
            complexity_threshold,
            context_budget_tokens,
        }
    }

    pub async fn execute(&self, req: SimpleRequest<'_>, timeout: Duration) -> RuntimeResult<FrameEnvelope> {
        validate_arguments(&req.descriptor.input_schema, &req.arguments)?;

        let prompt = req
            .arguments
            .get("prompt")
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::InvalidInput("missing required field `prompt`".to_string()))?
            .to_string();

        let mut prior_turns = match &req.continuation_id {
            Some(id) => self.continuity.load(id).await?,
            None => Vec::new(),
        };
        prior_turns = prepend_within_budget(prior_turns, self.context_budget_tokens);

        let required_capabilities: Vec<&str> = req.descriptor.required_capabilities.iter().copied().map(capability_str).collect();
        let estimated_input_tokens =
            prompt.len() / 4 + prior_turns.iter().map(Turn::estimated_tokens).sum::<usize>();

        let routing_req = RoutingRequest {
            explicit_model: req.explicit_model,
            estimated_input_tokens,
            tool_category: to_routing_category(req.descriptor.category),
            file_count: req.file_count,
            complexity_hint: req.complexity_hint,
            required_capabilities: &required_capabilities,
        };
        let decision = self.providers.route(&routing_req, self.long_context_threshold, self.complexity_threshold)?;

        let mut messages: Vec<Message> = prior_turns.iter().map(turn_to_message).collect();
        messages.push(Message::user(prompt.clone()));

        let response = tokio::time::timeout(
            timeout,
            self.providers.call_with_escalation(&decision, &required_capabilities, &messages, &[], ""),
        )
        .await
        .map_err(|_| RuntimeError::Timeout)??;

        let continuation_id = match req.continuation_id {
            Some(id) => id,
            None => self.continuity.begin().await,
        };
        self.continuity.append(&continuation_id, Turn::user(prompt)).await?;
        let content = conduit_tools::truncate_output(response.message.text().unwrap_or_default().to_string());
        self.continuity.append(&continuation_id, Turn::assistant(content.clone())).await?;

        Ok(FrameEnvelope::Ok {
            content,
            continuation_id: Some(continuation_id),
            usage: response.usage.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_providers::error::ProviderResult;
    use conduit_providers::model::ModelDescriptor;
    use conduit_providers::provider::LlmProvider;
    use conduit_providers::tier::Tier;
    use conduit_providers::types::{LlmResponse, LlmToolDefinition, StopReason, Usage};
    use serde_json::json;
    use std::sync::Arc;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }
        fn model(&self) -> &str {
            "echo-model"
        }
        fn tier(&self) -> Tier {
            Tier::Manager
        }
        async fn complete(&self, messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> ProviderResult<LlmResponse> {
            let last = messages.last().and_then(Message::text).unwrap_or_default().to_string();
            Ok(LlmResponse {
                message: Message::assistant(format!("echo: {last}")),
                has_tool_calls: false,
                stop_reason: StopReason::EndTurn,
                usage: Usage { input_tokens: 10, output_tokens: 5 },
            })
        }
        fn max_context_length(&self) -> usize {
            50_000
        }
        fn cost_per_token(&self) -> f64 {
            0.001
        }
        fn capabilities(&self) -> &[&'static str] {
            &[]
        }
    }

    fn frame() -> SimpleToolFrame {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ModelDescriptor::new("echo-model", "echo", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(EchoProvider),
        );
        let continuity = Arc::new(ConversationStore::new(Duration::from_secs(3600)));
        SimpleToolFrame::new(Arc::new(registry), continuity, 100_000, 0.7, 8_000)
    }

    fn chat_descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            "chat",
            conduit_tools::ToolCategory::Simple,
            json!({ "type": "object", "required": ["prompt"], "properties": { "prompt": { "type": "string" } } }),
        )
    }

    #[tokio::test]
    async fn missing_prompt_rejected_with_invalid_input() {
        let frame = frame();
        let descriptor = chat_descriptor();
        let req = SimpleRequest {
            descriptor: &descriptor,
            arguments: json!({}),
            continuation_id: None,
            explicit_model: None,
            file_count: 0,
            complexity_hint: None,
        };
        let err = frame.execute(req, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn successful_call_appends_two_turns_and_returns_ok() {
        let frame = frame();
        let descriptor = chat_descriptor();
        let req = SimpleRequest {
            descriptor: &descriptor,
            arguments: json!({ "prompt": "hello" }),
            continuation_id: None,
            explicit_model: None,
            file_count: 0,
            complexity_hint: None,
        };
        let envelope = frame.execute(req, Duration::from_secs(5)).await.unwrap();
        match envelope {
            FrameEnvelope::Ok { content, continuation_id, .. } => {
                assert_eq!(content, "echo: hello");
                let turns = frame.continuity.load(continuation_id.as_ref().unwrap()).await.unwrap();
                assert_eq!(turns.len(), 2);
            }
            FrameEnvelope::WorkflowPaused { .. } => panic!("expected Ok"),
        }
    }

    #[tokio::test]
    async fn unknown_continuation_fails() {
        let frame = frame();
        let descriptor = chat_descriptor();
        let req = SimpleRequest {
            descriptor: &descriptor,
            arguments: json!({ "prompt": "hello" }),
            continuation_id: Some(ContinuationId::new()),
            explicit_model: None,
            file_count: 0,
            complexity_hint: None,
        };
        let err = frame.execute(req, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Continuity(_)));
    }
}
