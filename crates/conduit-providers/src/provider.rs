//! LLM provider trait, adapted from the teacher's `astrid-llm` crate:
//! same shape, same blanket `Box<dyn LlmProvider>` impl, streaming dropped
//! (out of scope per spec §1 — only the `call`/`complete` contract and a
//! streaming variant are assumed, not implemented here).

use crate::error::ProviderResult;
use crate::tier::Tier;
use crate::types::{LlmResponse, LlmToolDefinition, Message};
use async_trait::async_trait;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;
    fn tier(&self) -> Tier;

    async fn complete(&self, messages: &[Message], tools: &[LlmToolDefinition], system: &str) -> ProviderResult<LlmResponse>;

    async fn complete_simple(&self, prompt: &str) -> ProviderResult<String> {
        let messages = vec![Message::user(prompt)];
        let response = self.complete(&messages, &[], "").await?;
        Ok(response.message.text().unwrap_or("").to_string())
    }

    /// Rough approximation: ~4 chars per token, same heuristic the teacher
    /// uses rather than a tokenizer dependency.
    fn count_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }

    fn max_context_length(&self) -> usize;

    fn cost_per_token(&self) -> f64;

    fn capabilities(&self) -> &[&'static str];
}

#[async_trait]
impl LlmProvider for Box<dyn LlmProvider> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn model(&self) -> &str {
        (**self).model()
    }

    fn tier(&self) -> Tier {
        (**self).tier()
    }

    async fn complete(&self, messages: &[Message], tools: &[LlmToolDefinition], system: &str) -> ProviderResult<LlmResponse> {
        (**self).complete(messages, tools, system).await
    }

    fn count_tokens(&self, text: &str) -> usize {
        (**self).count_tokens(text)
    }

    fn max_context_length(&self) -> usize {
        (**self).max_context_length()
    }

    fn cost_per_token(&self) -> f64 {
        (**self).cost_per_token()
    }

    fn capabilities(&self) -> &[&'static str] {
        (**self).capabilities()
    }
}

/// Configuration for a provider instance. `Debug` redacts the API key the
/// same way the teacher's `ProviderConfig` does — logging a config must
/// never leak the secret.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f64,
    pub base_url: Option<String>,
    pub context_window: Option<usize>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("has_api_key", &!self.api_key.is_empty())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("has_base_url", &self.base_url.is_some())
            .field("context_window", &self.context_window)
            .finish()
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.7,
            base_url: None,
            context_window: None,
        }
    }

    #[must_use]
    pub fn max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = temp.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn context_window(mut self, size: usize) -> Self {
        self.context_window = Some(size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let config = ProviderConfig::new("sk-super-secret", "claude-test");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-super-secret"));
        assert!(debug.contains("has_api_key: true"));
    }
}
