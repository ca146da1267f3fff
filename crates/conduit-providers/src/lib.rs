//! LLM provider abstraction, tiered model registry, and selection/escalation
//! routing (spec §4.4).

pub mod claude;
pub mod error;
pub mod model;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod routing;
pub mod tier;
pub mod types;

pub use claude::ClaudeProvider;
pub use error::{ProviderError, ProviderResult};
pub use model::ModelDescriptor;
pub use provider::{LlmProvider, ProviderConfig};
pub use registry::{ProviderRegistry, RoutingDecision};
pub use routing::{complexity_score, select_tier, RoutingRequest, ToolCategory};
pub use tier::Tier;
