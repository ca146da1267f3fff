use conduit_core::{ContinuationId, WorkflowId};
use serde::{Deserialize, Serialize};

/// Response envelope produced by a tool frame, independent of the wire
/// format the daemon eventually serialises it into (spec §6's `payload` /
/// `pointer` split is applied on top of this by the request handler, after
/// the message bus's size gate runs).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameEnvelope {
    Ok {
        content: String,
        continuation_id: Option<ContinuationId>,
        usage: UsageSummary,
    },
    WorkflowPaused {
        workflow_id: WorkflowId,
        continuation_id: ContinuationId,
        step_number: u32,
        total_steps: u32,
        findings_so_far: String,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UsageSummary {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl From<conduit_providers::types::Usage> for UsageSummary {
    fn from(usage: conduit_providers::types::Usage) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
        }
    }
}
