use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
    Tool,
}

/// One entry in a continuation's ordered history. `file_refs` are opaque
/// provider file ids — the store never holds raw file bytes (spec §4.2).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub tool_name: Option<String>,
    pub file_refs: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            tool_name: None,
            file_refs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            tool_name: None,
            file_refs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Tool,
            content: content.into(),
            tool_name: Some(tool_name.into()),
            file_refs: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_file_refs(mut self, file_refs: Vec<String>) -> Self {
        self.file_refs = file_refs;
        self
    }

    /// Rough token estimate, same `len() / 4` heuristic the teacher uses
    /// for message budgeting (`AgentSession::add_message`).
    pub fn estimated_tokens(&self) -> usize {
        (self.content.len() / 4).max(1)
    }
}
