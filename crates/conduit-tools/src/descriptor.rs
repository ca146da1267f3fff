use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Simple,
    Workflow,
    Utility,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Internal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Vision,
    LongContext,
    Tools,
    WebSearch,
}

/// `{name, category, visibility, input_schema, required_capabilities,
/// timeout_budget}` from spec §3. Immutable after registry load, except for
/// `enabled`, which a feature flag may flip at runtime (reported to clients
/// as `ToolDisabled` rather than `UnknownTool`).
#[derive(Clone, Debug)]
pub struct ToolDescriptor {
    pub name: String,
    pub category: ToolCategory,
    pub visibility: Visibility,
    pub input_schema: Value,
    pub required_capabilities: Vec<Capability>,
    pub timeout_budget: std::time::Duration,
    pub enabled: bool,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, category: ToolCategory, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            category,
            visibility: Visibility::Public,
            input_schema,
            required_capabilities: Vec::new(),
            timeout_budget: std::time::Duration::from_secs(30),
            enabled: true,
        }
    }

    #[must_use]
    pub fn internal(mut self) -> Self {
        self.visibility = Visibility::Internal;
        self
    }

    #[must_use]
    pub fn requiring(mut self, capabilities: Vec<Capability>) -> Self {
        self.required_capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout_budget = timeout;
        self
    }
}
