//! The two tool bodies the daemon ships out of the box: a simple chat tool
//! and a multi-step debugging workflow. Everything else a deployment wants
//! (code review, analyze, ...) plugs in the same way — a `ToolDescriptor`
//! plus, for workflow tools, an `expert_validate` implementation.

use async_trait::async_trait;
use conduit_tools::{Capability, Tool, ToolCategory, ToolContext, ToolDescriptor, ToolResult, WorkflowTool};
use serde_json::{json, Value};

pub struct ChatTool(ToolDescriptor);

impl ChatTool {
    pub fn new() -> Self {
        Self(ToolDescriptor::new(
            "chat",
            ToolCategory::Simple,
            json!({
                "type": "object",
                "required": ["prompt"],
                "properties": {
                    "prompt": { "type": "string" },
                },
            }),
        ))
    }
}

#[async_trait]
impl Tool for ChatTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.0
    }

    // Dispatch for a simple tool goes through `SimpleToolFrame`, which
    // reads the descriptor directly rather than calling this method — see
    // `frame::simple`. Kept for trait-object uniformity with `ToolRegistry`.
    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult<String> {
        unreachable!("dispatched through SimpleToolFrame, not Tool::execute")
    }
}

pub struct DebugWorkflowTool(ToolDescriptor);

impl DebugWorkflowTool {
    pub fn new() -> Self {
        Self(
            ToolDescriptor::new(
                "debug",
                ToolCategory::Workflow,
                json!({
                    "type": "object",
                    "required": ["step", "step_number", "total_steps", "next_step_required", "findings", "confidence"],
                    "properties": {
                        "step": { "type": "string" },
                        "step_number": { "type": "integer" },
                        "total_steps": { "type": "integer" },
                        "next_step_required": { "type": "boolean" },
                        "findings": { "type": "string" },
                        "confidence": { "type": "string" },
                    },
                }),
            )
            .requiring(vec![Capability::Tools]),
        )
    }
}

#[async_trait]
impl Tool for DebugWorkflowTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.0
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult<String> {
        unreachable!("dispatched through WorkflowEngine, not Tool::execute")
    }
}

#[async_trait]
impl WorkflowTool for DebugWorkflowTool {
    async fn expert_validate(&self, findings: &str, include_files: bool, _ctx: &ToolContext) -> ToolResult<String> {
        let prefix = if include_files {
            "review the investigation below, including any referenced file contents"
        } else {
            "review the investigation below; file contents were withheld by policy"
        };
        Ok(format!("{prefix}:\n\n{findings}"))
    }
}
