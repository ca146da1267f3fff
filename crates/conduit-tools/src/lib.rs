//! Tool registry: descriptors, schemas, visibility filtering (spec §4.5).

pub mod descriptor;
pub mod error;
pub mod registry;
pub mod tool;

pub use descriptor::{Capability, ToolCategory, ToolDescriptor, Visibility};
pub use error::{ToolError, ToolResult};
pub use registry::ToolRegistry;
pub use tool::{truncate_output, SharedTool, Tool, ToolContext, WorkflowTool, MAX_OUTPUT_CHARS};
