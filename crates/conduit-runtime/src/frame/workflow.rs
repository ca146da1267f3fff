//! Workflow Tool Frame (spec §4.7): a pausable multi-step state machine
//! with at most one expert-validation provider call at finalisation.
//! Persistence shape grounded in the teacher's `AgentSession`/
//! `SerializableSession` round-trip discipline (`astrid-runtime/src/session.rs`).

use crate::error::{RuntimeError, RuntimeResult};
use crate::envelope::{FrameEnvelope, UsageSummary};
use chrono::{DateTime, Utc};
use conduit_core::{ContinuationId, WorkflowId};
use conduit_providers::tier::Tier;
use conduit_providers::ProviderRegistry;
use conduit_tools::{ToolContext, WorkflowTool};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Exploring,
    Low,
    Medium,
    High,
    VeryHigh,
    Certain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Paused,
    Finalizing,
    Complete,
    Cancelled,
}

/// Fixed argument shape workflow tools expose, per spec §4.7.
#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowStepArgs {
    pub step: String,
    pub step_number: u32,
    pub total_steps: u32,
    pub next_step_required: bool,
    pub findings: String,
    #[serde(default)]
    pub hypothesis: Option<String>,
    pub confidence: Confidence,
    #[serde(default)]
    pub relevant_files: Vec<String>,
    pub continuation_id: Option<ContinuationId>,
}

/// `{workflow_id, tool_name, step_number, total_steps, next_step_required,
/// findings_so_far, hypothesis?, confidence, relevant_files, paused_at,
/// continuation_id}` from spec §3, plus the bookkeeping the frame itself
/// needs: `phase` and a `cached_failure` for idempotent FINALIZING retries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_id: WorkflowId,
    pub tool_name: String,
    pub step_number: u32,
    pub total_steps: u32,
    pub next_step_required: bool,
    pub findings_so_far: String,
    pub hypothesis: Option<String>,
    pub confidence: Confidence,
    pub relevant_files: Vec<String>,
    pub paused_at: DateTime<Utc>,
    pub continuation_id: ContinuationId,
    pub phase: Phase,
    pub cached_failure: Option<String>,
}

/// Multi-step state machine plus optional expert validation at
/// finalisation. One entry per continuation — a continuation carries at
/// most one in-flight workflow, matching the fixed argument shape's
/// `continuation_id` field being mandatory for every step after the first.
pub struct WorkflowEngine {
    states: RwLock<HashMap<String, WorkflowState>>,
    providers: Arc<ProviderRegistry>,
    expert_validation_enabled: bool,
    include_files: bool,
    cancelled_tombstone_ttl: Duration,
}

impl WorkflowEngine {
    pub fn new(providers: Arc<ProviderRegistry>, expert_validation_enabled: bool, include_files: bool, cancelled_tombstone_ttl: Duration) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            providers,
            expert_validation_enabled,
            include_files,
            cancelled_tombstone_ttl,
        }
    }

    /// Advance the state machine by one step. Enforces monotonic
    /// `step_number` per continuation (Testable Property 2); in
    /// `FINALIZING`, calls the expert model at most once per completion
    /// (Testable Property 8), gated on `include_files` regardless of any
    /// per-tool override (Testable Property 9).
    pub async fn step(&self, tool: &dyn WorkflowTool, tool_name: &str, args: WorkflowStepArgs, ctx: &ToolContext) -> RuntimeResult<FrameEnvelope> {
        let continuation_id = args
            .continuation_id
            .clone()
            .ok_or_else(|| RuntimeError::InvalidInput("workflow step requires continuation_id".to_string()))?;
        let key = continuation_id.as_str().to_string();

        let (workflow_id, idempotent_failure) = {
            let states = self.states.read().await;
            match states.get(&key) {
                None => {
                    if args.step_number != 1 {
                        return Err(RuntimeError::WorkflowOrderError { expected: 1, got: args.step_number });
                    }
                    (WorkflowId::new(), None)
                }
                Some(existing) => {
                    if matches!(existing.phase, Phase::Complete | Phase::Cancelled) {
                        return Err(RuntimeError::WorkflowOrderError { expected: existing.step_number + 1, got: args.step_number });
                    }
                    if existing.step_number == args.step_number && existing.cached_failure.is_some() {
                        (existing.workflow_id.clone(), existing.cached_failure.clone())
                    } else {
                        let expected = existing.step_number + 1;
                        if args.step_number != expected {
                            return Err(RuntimeError::WorkflowOrderError { expected, got: args.step_number });
                        }
                        (existing.workflow_id.clone(), None)
                    }
                }
            }
        };

        if let Some(cached) = idempotent_failure {
            return Err(RuntimeError::Tool(conduit_tools::ToolError::ExecutionFailed(cached)));
        }

        let mut state = WorkflowState {
            workflow_id,
            tool_name: tool_name.to_string(),
            step_number: args.step_number,
            total_steps: args.total_steps,
            next_step_required: args.next_step_required,
            findings_so_far: args.findings,
            hypothesis: args.hypothesis,
            confidence: args.confidence,
            relevant_files: args.relevant_files,
            paused_at: Utc::now(),
            continuation_id: continuation_id.clone(),
            phase: if args.next_step_required { Phase::Paused } else { Phase::Finalizing },
            cached_failure: None,
        };

        if args.next_step_required {
            let envelope = FrameEnvelope::WorkflowPaused {
                workflow_id: state.workflow_id.clone(),
                continuation_id: state.continuation_id.clone(),
                step_number: state.step_number,
                total_steps: state.total_steps,
                findings_so_far: state.findings_so_far.clone(),
            };
            self.states.write().await.insert(key, state);
            return Ok(envelope);
        }

        // FINALIZING: no lock held across the provider call (spec §5).
        let content = if self.expert_validation_enabled {
            match self.run_expert_validation(tool, &state, ctx).await {
                Ok(content) => content,
                Err(err) => {
                    state.phase = Phase::Paused;
                    state.cached_failure = Some(err.to_string());
                    self.states.write().await.insert(key, state);
                    return Err(err);
                }
            }
        } else {
            state.findings_so_far.clone()
        };

        state.phase = Phase::Complete;
        self.states.write().await.insert(key, state.clone());

        Ok(FrameEnvelope::Ok {
            content,
            continuation_id: Some(state.continuation_id),
            usage: UsageSummary::default(),
        })
    }

    async fn run_expert_validation(&self, tool: &dyn WorkflowTool, state: &WorkflowState, ctx: &ToolContext) -> RuntimeResult<String> {
        let prompt = tool.expert_validate(&state.findings_so_far, self.include_files, ctx).await?;
        let decision = self.providers.route_from_tier(Tier::Complex, &[])?;
        let response = self
            .providers
            .call_with_escalation(&decision, &[], &[conduit_providers::types::Message::user(prompt)], &[], "")
            .await?;
        Ok(response.message.text().unwrap_or_default().to_string())
    }

    pub async fn cancel(&self, continuation_id: &ContinuationId) {
        let mut states = self.states.write().await;
        if let Some(state) = states.get_mut(continuation_id.as_str()) {
            if !matches!(state.phase, Phase::Complete | Phase::Cancelled) {
                state.phase = Phase::Cancelled;
                state.paused_at = Utc::now();
            }
        }
    }

    /// Removes cancelled entries whose tombstone TTL has elapsed. PAUSED
    /// and FINALIZING-failed entries are never swept here — only explicit
    /// cancellation starts the tombstone clock (spec §4.7).
    pub async fn sweep(&self) -> usize {
        let ttl = chrono::Duration::from_std(self.cancelled_tombstone_ttl).unwrap_or(chrono::Duration::zero());
        let now = Utc::now();
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, s| !(s.phase == Phase::Cancelled && now - s.paused_at > ttl));
        before - states.len()
    }

    pub async fn state_of(&self, continuation_id: &ContinuationId) -> Option<WorkflowState> {
        self.states.read().await.get(continuation_id.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use conduit_providers::error::ProviderResult;
    use conduit_providers::model::ModelDescriptor;
    use conduit_providers::provider::LlmProvider;
    use conduit_providers::types::{LlmResponse, LlmToolDefinition, Message, StopReason, Usage};
    use conduit_tools::{Tool, ToolDescriptor, ToolResult};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ExpertProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LlmProvider for ExpertProvider {
        fn name(&self) -> &str {
            "expert"
        }
        fn model(&self) -> &str {
            "expert-model"
        }
        fn tier(&self) -> Tier {
            Tier::Complex
        }
        async fn complete(&self, messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> ProviderResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = messages.last().and_then(Message::text).unwrap_or_default().to_string();
            Ok(LlmResponse {
                message: Message::assistant(format!("validated: {text}")),
                has_tool_calls: false,
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
        fn max_context_length(&self) -> usize {
            200_000
        }
        fn cost_per_token(&self) -> f64 {
            0.01
        }
        fn capabilities(&self) -> &[&'static str] {
            &[]
        }
    }

    struct RecordingTool {
        seen_include_files: std::sync::Mutex<Vec<bool>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn descriptor(&self) -> &ToolDescriptor {
            unimplemented!("not exercised in these tests")
        }
        async fn execute(&self, _args: serde_json::Value, _ctx: &ToolContext) -> ToolResult<String> {
            unimplemented!("not exercised in these tests")
        }
    }

    #[async_trait]
    impl WorkflowTool for RecordingTool {
        async fn expert_validate(&self, findings: &str, include_files: bool, _ctx: &ToolContext) -> ToolResult<String> {
            self.seen_include_files.lock().unwrap().push(include_files);
            Ok(findings.to_string())
        }
    }

    fn ctx() -> ToolContext {
        ToolContext { session_id: conduit_core::SessionId::new(), continuation_id: None }
    }

    fn engine_with_expert(calls: Arc<AtomicUsize>, expert_enabled: bool, include_files: bool) -> WorkflowEngine {
        let mut registry = ProviderRegistry::new();
        registry.register(
            ModelDescriptor::new("expert-model", "expert", 200_000, 0.01, vec![], Tier::Complex),
            Arc::new(ExpertProvider { calls }),
        );
        WorkflowEngine::new(Arc::new(registry), expert_enabled, include_files, Duration::from_secs(3600))
    }

    fn step_args(step_number: u32, total_steps: u32, next_step_required: bool, continuation_id: Option<ContinuationId>) -> WorkflowStepArgs {
        WorkflowStepArgs {
            step: "investigate".to_string(),
            step_number,
            total_steps,
            next_step_required,
            findings: format!("findings at step {step_number}"),
            hypothesis: None,
            confidence: Confidence::Medium,
            relevant_files: vec![],
            continuation_id,
        }
    }

    #[tokio::test]
    async fn first_step_must_be_step_number_one() {
        let engine = engine_with_expert(Arc::new(AtomicUsize::new(0)), false, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let args = step_args(2, 2, false, Some(continuation_id));
        let err = engine.step(&tool, "investigate", args, &ctx()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::WorkflowOrderError { expected: 1, got: 2 }));
    }

    #[tokio::test]
    async fn out_of_order_second_step_rejected() {
        let engine = engine_with_expert(Arc::new(AtomicUsize::new(0)), false, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 3, true, Some(continuation_id.clone()));
        engine.step(&tool, "investigate", first, &ctx()).await.unwrap();

        let skipped = step_args(3, 3, false, Some(continuation_id));
        let err = engine.step(&tool, "investigate", skipped, &ctx()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::WorkflowOrderError { expected: 2, got: 3 }));
    }

    #[tokio::test]
    async fn paused_step_returns_workflow_paused_with_no_provider_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with_expert(calls.clone(), true, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let args = step_args(1, 2, true, Some(continuation_id));
        let envelope = engine.step(&tool, "investigate", args, &ctx()).await.unwrap();
        assert!(matches!(envelope, FrameEnvelope::WorkflowPaused { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finalizing_calls_expert_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with_expert(calls.clone(), true, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 2, true, Some(continuation_id.clone()));
        engine.step(&tool, "investigate", first, &ctx()).await.unwrap();
        let second = step_args(2, 2, false, Some(continuation_id));
        let envelope = engine.step(&tool, "investigate", second, &ctx()).await.unwrap();
        assert!(matches!(envelope, FrameEnvelope::Ok { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expert_disabled_skips_provider_call_entirely() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with_expert(calls.clone(), false, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 1, false, Some(continuation_id));
        let envelope = engine.step(&tool, "investigate", first, &ctx()).await.unwrap();
        assert!(matches!(envelope, FrameEnvelope::Ok { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn include_files_false_is_passed_through_regardless_of_tool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with_expert(calls, true, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 1, false, Some(continuation_id));
        engine.step(&tool, "investigate", first, &ctx()).await.unwrap();
        let seen = tool.seen_include_files.lock().unwrap();
        assert_eq!(*seen, vec![false]);
    }

    #[tokio::test]
    async fn cancel_transitions_paused_workflow_to_cancelled() {
        let engine = engine_with_expert(Arc::new(AtomicUsize::new(0)), false, false);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 2, true, Some(continuation_id.clone()));
        engine.step(&tool, "investigate", first, &ctx()).await.unwrap();
        engine.cancel(&continuation_id).await;
        let state = engine.state_of(&continuation_id).await.unwrap();
        assert_eq!(state.phase, Phase::Cancelled);
    }

    #[tokio::test]
    async fn sweep_removes_only_cancelled_entries_past_ttl() {
        let mut engine = engine_with_expert(Arc::new(AtomicUsize::new(0)), false, false);
        engine.cancelled_tombstone_ttl = Duration::from_millis(0);
        let tool = RecordingTool { seen_include_files: Default::default() };
        let continuation_id = ContinuationId::new();
        let first = step_args(1, 2, true, Some(continuation_id.clone()));
        engine.step(&tool, "investigate", first, &ctx()).await.unwrap();
        engine.cancel(&continuation_id).await;
        let removed = engine.sweep().await;
        assert_eq!(removed, 1);
        assert!(engine.state_of(&continuation_id).await.is_none());
    }
}
