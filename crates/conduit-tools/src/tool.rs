use crate::error::ToolResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Per-call context handed to a tool's `execute`. Deliberately narrow: a
/// tool is a descriptor plus a pure function of `(args, ctx)`, per the
/// composition-over-inheritance REDESIGN FLAG (spec §9) — no per-tool
/// override hooks, no mixins.
#[derive(Clone)]
pub struct ToolContext {
    pub session_id: conduit_core::SessionId,
    pub continuation_id: Option<conduit_core::ContinuationId>,
}

/// `execute(args, ctx) -> result`, the whole contract for a simple tool.
/// Individual tool bodies (chat, code-review, analyse, ...) are out of
/// scope per spec §1 — this crate defines the frame, not the bodies.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> &crate::descriptor::ToolDescriptor;

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult<String>;
}

/// Optional supertrait for multi-step tools. `workflow_step` is a pure
/// function of `(state, args, ctx) -> (state', envelope)`; the frame in
/// `conduit-runtime` provides everything else (timeouts, continuation,
/// routing, pause/resume persistence).
///
/// `include_files` is decided by the frame from global configuration and
/// handed down here rather than read by the implementor from its own
/// config — a per-tool override of the file-inclusion policy is explicitly
/// disallowed, so the tool has no config of its own to consult.
#[async_trait]
pub trait WorkflowTool: Tool {
    async fn expert_validate(
        &self,
        findings: &str,
        include_files: bool,
        ctx: &ToolContext,
    ) -> ToolResult<String>;
}

/// Output cap applied before the message-bus size gate is even reached,
/// mirroring the teacher's `MAX_OUTPUT_CHARS`/`truncate_output` pair.
pub const MAX_OUTPUT_CHARS: usize = 30_000;

pub fn truncate_output(output: String) -> String {
    if output.chars().count() <= MAX_OUTPUT_CHARS {
        return output;
    }
    let truncated: String = output.chars().take(MAX_OUTPUT_CHARS).collect();
    format!("{truncated}\n\n... (output truncated — exceeded {MAX_OUTPUT_CHARS} character limit)")
}

pub type SharedTool = Arc<dyn Tool>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_output_unchanged() {
        assert_eq!(truncate_output("hello".to_string()), "hello");
    }

    #[test]
    fn long_output_truncated_with_marker() {
        let long = "a".repeat(MAX_OUTPUT_CHARS + 100);
        let result = truncate_output(long);
        assert!(result.contains("truncated"));
        assert!(result.len() < MAX_OUTPUT_CHARS + 200);
    }
}
