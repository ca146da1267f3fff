use crate::descriptor::{ToolDescriptor, Visibility};
use crate::error::{ToolError, ToolResult};
use crate::tool::SharedTool;
use std::collections::HashMap;

/// Holds all tool descriptors loaded at startup (spec §4.5). Immutable
/// after load except for the `enabled` flag on a descriptor, which a
/// feature flag may flip — reported to clients as `ToolDisabled`, a
/// distinct error from `UnknownTool` (missing from the registry entirely).
pub struct ToolRegistry {
    tools: HashMap<String, SharedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: SharedTool) {
        let name = tool.descriptor().name.clone();
        self.tools.insert(name, tool);
    }

    /// Resolution by name; `UnknownTool` if absent, `ToolDisabled` if
    /// present but feature-flagged off.
    pub fn get(&self, name: &str) -> ToolResult<&SharedTool> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        if !tool.descriptor().enabled {
            return Err(ToolError::ToolDisabled(name.to_string()));
        }
        Ok(tool)
    }

    /// Public listing: filters out `visibility = internal` entries.
    pub fn list_public(&self) -> Vec<&ToolDescriptor> {
        self.tools
            .values()
            .map(|t| t.descriptor())
            .filter(|d| d.visibility == Visibility::Public && d.enabled)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
