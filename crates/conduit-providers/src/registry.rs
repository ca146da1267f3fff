use crate::error::{ProviderError, ProviderResult};
use crate::model::ModelDescriptor;
use crate::provider::LlmProvider;
use crate::retry::backoff_delay;
use crate::routing::{select_tier, RoutingRequest};
use crate::tier::Tier;
use crate::types::{LlmResponse, LlmToolDefinition, Message};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_RETRY_MAX: u32 = 3;

struct RegisteredModel {
    descriptor: ModelDescriptor,
    provider: Arc<dyn LlmProvider>,
}

/// Enumerates models with their capabilities/cost/context window, selects
/// and escalates per spec §4.4. Readers see a consistent snapshot of
/// availability because each `ModelDescriptor`'s flag is its own atomic —
/// no registry-wide lock is ever held across a provider call.
pub struct ProviderRegistry {
    models: HashMap<String, RegisteredModel>,
    retry_max: u32,
}

pub struct RoutingDecision {
    pub model_name: String,
    pub tier: Tier,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
            retry_max: DEFAULT_RETRY_MAX,
        }
    }

    pub fn with_retry_max(mut self, retry_max: u32) -> Self {
        self.retry_max = retry_max;
        self
    }

    pub fn register(&mut self, descriptor: ModelDescriptor, provider: Arc<dyn LlmProvider>) {
        self.models
            .insert(descriptor.name.clone(), RegisteredModel { descriptor, provider });
    }

    fn models_in_tier(&self, tier: Tier) -> Vec<&RegisteredModel> {
        self.models
            .values()
            .filter(|m| m.descriptor.tier == tier && m.descriptor.is_available())
            .collect()
    }

    /// Within a tier: lowest cost wins; ties break by larger context window,
    /// then lexicographic name for determinism (spec §4.4 step 5).
    fn pick_in_tier(&self, tier: Tier, required_capabilities: &[&str]) -> Option<&str> {
        let mut candidates: Vec<&RegisteredModel> = self
            .models_in_tier(tier)
            .into_iter()
            .filter(|m| required_capabilities.iter().all(|cap| m.descriptor.has_capability(cap)))
            .collect();

        candidates.sort_by(|a, b| {
            a.descriptor
                .cost_per_token
                .partial_cmp(&b.descriptor.cost_per_token)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.descriptor.context_window.cmp(&a.descriptor.context_window))
                .then_with(|| a.descriptor.name.cmp(&b.descriptor.name))
        });

        candidates.first().map(|m| m.descriptor.name.as_str())
    }

    /// Five-step selection algorithm from spec §4.4.
    pub fn route(
        &self,
        req: &RoutingRequest<'_>,
        long_context_threshold: usize,
        complexity_threshold: f64,
    ) -> ProviderResult<RoutingDecision> {
        if let Some(explicit) = req.explicit_model {
            if let Some(model) = self.models.get(explicit) {
                if model.descriptor.is_available() {
                    return Ok(RoutingDecision {
                        model_name: explicit.to_string(),
                        tier: model.descriptor.tier,
                    });
                }
            }
        }

        let mut tier = select_tier(req, long_context_threshold, complexity_threshold);
        loop {
            if let Some(model_name) = self.pick_in_tier(tier, req.required_capabilities) {
                return Ok(RoutingDecision {
                    model_name: model_name.to_string(),
                    tier,
                });
            }
            match tier.next() {
                Some(next) => tier = next,
                None => {
                    return Err(ProviderError::CapabilityUnavailable(
                        req.required_capabilities.iter().map(|s| s.to_string()).collect(),
                    ))
                }
            }
        }
    }

    /// Select a model starting at a specific tier and escalating upward,
    /// bypassing the usual five-step selection. Used by workflow expert
    /// validation (spec §4.7), which always wants a complex-tier model
    /// regardless of the originating request's own routing decision.
    pub fn route_from_tier(&self, tier: Tier, required_capabilities: &[&str]) -> ProviderResult<RoutingDecision> {
        let mut tier = tier;
        loop {
            if let Some(model_name) = self.pick_in_tier(tier, required_capabilities) {
                return Ok(RoutingDecision {
                    model_name: model_name.to_string(),
                    tier,
                });
            }
            match tier.next() {
                Some(next) => tier = next,
                None => {
                    return Err(ProviderError::CapabilityUnavailable(
                        required_capabilities.iter().map(|s| s.to_string()).collect(),
                    ))
                }
            }
        }
    }

    /// Issue the provider call for `model_name`, retrying retriable
    /// failures with exponential backoff. A terminal failure marks the
    /// model unavailable and is returned to the caller as-is — this
    /// method never re-routes to a different model itself. Callers that
    /// want spec §4.4's escalation-on-terminal-failure behaviour use
    /// [`Self::call_with_escalation`].
    pub async fn call(
        &self,
        model_name: &str,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> ProviderResult<LlmResponse> {
        let model = self
            .models
            .get(model_name)
            .ok_or_else(|| ProviderError::ModelNotSupported { model: model_name.to_string() })?;

        let mut last_err = None;
        for attempt in 0..=self.retry_max {
            match model.provider.complete(messages, tools, system).await {
                Ok(response) => {
                    model.descriptor.mark_available();
                    return Ok(response);
                }
                Err(err) if err.is_retriable() && attempt < self.retry_max => {
                    tracing::warn!(model = model_name, attempt, error = %err, "retriable provider error, backing off");
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    last_err = Some(err);
                }
                Err(err) => {
                    model.descriptor.mark_unavailable();
                    return Err(err);
                }
            }
        }
        Err(last_err.unwrap_or(ProviderError::ModelNotSupported {
            model: model_name.to_string(),
        }))
    }

    /// Calls `decision.model_name`; on terminal failure, re-routes once
    /// more excluding the failed model — first within `decision.tier`
    /// (which `call`'s `mark_unavailable` already excludes it from), then
    /// exactly one tier up if the current tier has nothing left — and
    /// retries against that selection. Bounded to one tier jump per
    /// request per spec §4.4; if escalation finds nothing, the original
    /// error is returned.
    pub async fn call_with_escalation(
        &self,
        decision: &RoutingDecision,
        required_capabilities: &[&str],
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> ProviderResult<LlmResponse> {
        let original_err = match self.call(&decision.model_name, messages, tools, system).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if let Some(model_name) = self.pick_in_tier(decision.tier, required_capabilities) {
            return self.call(model_name, messages, tools, system).await;
        }

        match decision.tier.next() {
            Some(next_tier) => match self.pick_in_tier(next_tier, required_capabilities) {
                Some(model_name) => self.call(model_name, messages, tools, system).await,
                None => Err(original_err),
            },
            None => Err(original_err),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::ToolCategory;

    struct FakeProvider {
        tier: Tier,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }
        fn model(&self) -> &str {
            "fake-model"
        }
        fn tier(&self) -> Tier {
            self.tier
        }
        async fn complete(&self, _messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> ProviderResult<LlmResponse> {
            if self.should_fail {
                Err(ProviderError::ModelNotSupported { model: "fake-model".into() })
            } else {
                Ok(LlmResponse {
                    message: Message::assistant("ok"),
                    has_tool_calls: false,
                    stop_reason: crate::types::StopReason::EndTurn,
                    usage: Default::default(),
                })
            }
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

    fn registry_with(tier: Tier, cost: f64, name: &str) -> ProviderRegistry {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new(name, "fake", 50_000, cost, vec![], tier),
            Arc::new(FakeProvider { tier, should_fail: false }),
        );
        reg
    }

    #[test]
    fn picks_lowest_cost_within_tier() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new("cheap", "fake", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: false }),
        );
        reg.register(
            ModelDescriptor::new("expensive", "fake", 50_000, 0.01, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: false }),
        );
        let req = RoutingRequest {
            explicit_model: None,
            estimated_input_tokens: 10,
            tool_category: ToolCategory::Simple,
            file_count: 0,
            complexity_hint: None,
            required_capabilities: &[],
        };
        let decision = reg.route(&req, 100_000, 0.7).unwrap();
        assert_eq!(decision.model_name, "cheap");
    }

    #[test]
    fn escalates_to_next_tier_when_none_available() {
        let reg = registry_with(Tier::Complex, 0.01, "complex-model");
        let req = RoutingRequest {
            explicit_model: None,
            estimated_input_tokens: 10,
            tool_category: ToolCategory::Workflow,
            file_count: 5,
            complexity_hint: Some(0.9),
            required_capabilities: &[],
        };
        // no manager-tier model registered, so selection escalates to complex
        let decision = reg.route(&req, 100_000, 0.7).unwrap();
        assert_eq!(decision.tier, Tier::Complex);
    }

    #[test]
    fn no_model_anywhere_yields_capability_unavailable() {
        let reg = ProviderRegistry::new();
        let req = RoutingRequest {
            explicit_model: None,
            estimated_input_tokens: 10,
            tool_category: ToolCategory::Simple,
            file_count: 0,
            complexity_hint: None,
            required_capabilities: &[],
        };
        assert!(matches!(reg.route(&req, 100_000, 0.7), Err(ProviderError::CapabilityUnavailable(_))));
    }

    #[tokio::test]
    async fn call_marks_model_unavailable_on_terminal_failure() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new("flaky", "fake", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: true }),
        );
        let err = reg.call("flaky", &[], &[], "").await.unwrap_err();
        assert!(matches!(err, ProviderError::ModelNotSupported { .. }));
        assert!(!reg.models.get("flaky").unwrap().descriptor.is_available());
    }

    #[tokio::test]
    async fn escalation_falls_back_to_another_model_in_the_same_tier() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new("flaky", "fake", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: true }),
        );
        reg.register(
            ModelDescriptor::new("backup", "fake", 50_000, 0.002, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: false }),
        );
        let decision = RoutingDecision { model_name: "flaky".to_string(), tier: Tier::Manager };
        let response = reg.call_with_escalation(&decision, &[], &[], &[], "").await.unwrap();
        assert_eq!(response.message.text().unwrap(), "ok");
        assert!(!reg.models.get("flaky").unwrap().descriptor.is_available());
    }

    #[tokio::test]
    async fn escalation_jumps_one_tier_when_current_tier_is_exhausted() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new("flaky", "fake", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: true }),
        );
        reg.register(
            ModelDescriptor::new("complex-backup", "fake", 50_000, 0.01, vec![], Tier::Complex),
            Arc::new(FakeProvider { tier: Tier::Complex, should_fail: false }),
        );
        let decision = RoutingDecision { model_name: "flaky".to_string(), tier: Tier::Manager };
        let response = reg.call_with_escalation(&decision, &[], &[], &[], "").await.unwrap();
        assert_eq!(response.message.text().unwrap(), "ok");
    }

    #[tokio::test]
    async fn escalation_returns_original_error_when_nothing_else_is_available() {
        let mut reg = ProviderRegistry::new();
        reg.register(
            ModelDescriptor::new("flaky", "fake", 50_000, 0.001, vec![], Tier::Manager),
            Arc::new(FakeProvider { tier: Tier::Manager, should_fail: true }),
        );
        let decision = RoutingDecision { model_name: "flaky".to_string(), tier: Tier::Manager };
        let err = reg.call_with_escalation(&decision, &[], &[], &[], "").await.unwrap_err();
        assert!(matches!(err, ProviderError::ModelNotSupported { .. }));
    }
}
