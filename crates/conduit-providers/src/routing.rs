use crate::tier::Tier;

/// The inputs `complexity_score` and tier selection need from an inbound
/// request, deliberately narrow — the routing layer doesn't need the full
/// tool-call payload, just what affects the decision.
pub struct RoutingRequest<'a> {
    pub explicit_model: Option<&'a str>,
    pub estimated_input_tokens: usize,
    pub tool_category: ToolCategory,
    pub file_count: usize,
    pub complexity_hint: Option<f64>,
    pub required_capabilities: &'a [&'a str],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolCategory {
    Simple,
    Workflow,
    Utility,
}

/// Open Question (spec §9) resolved in DESIGN.md: workflow tools score
/// higher than simple/utility tools; file count and an explicit client
/// hint each contribute an independent term, summed and clamped to
/// `[0.0, 1.0]`. The ordering of checks in `select_tier` is normative per
/// spec §4.4; these weights are configuration-adjacent but fixed here
/// rather than pulled from env, since spec §6 does not list them as an
/// environment key.
const WORKFLOW_BASE_SCORE: f64 = 0.5;
const SIMPLE_BASE_SCORE: f64 = 0.1;
const PER_FILE_SCORE: f64 = 0.05;
const MAX_FILE_SCORE: f64 = 0.3;

pub fn complexity_score(req: &RoutingRequest<'_>) -> f64 {
    let base = match req.tool_category {
        ToolCategory::Workflow => WORKFLOW_BASE_SCORE,
        ToolCategory::Simple | ToolCategory::Utility => SIMPLE_BASE_SCORE,
    };
    let file_score = (req.file_count as f64 * PER_FILE_SCORE).min(MAX_FILE_SCORE);
    let hint_score = req.complexity_hint.unwrap_or(0.0).clamp(0.0, 1.0) * 0.3;
    (base + file_score + hint_score).clamp(0.0, 1.0)
}

/// Five-step selection algorithm from spec §4.4, steps 1-4 (tier only;
/// picking a model within the tier is `ProviderRegistry::select_model`).
pub fn select_tier(req: &RoutingRequest<'_>, long_context_threshold: usize, complexity_threshold: f64) -> Tier {
    if req.estimated_input_tokens > long_context_threshold {
        return Tier::LongContext;
    }
    if complexity_score(req) > complexity_threshold {
        return Tier::Complex;
    }
    Tier::Manager
}
