//! Tool execution frames (spec §4.6, §4.7): the shared envelope a frame
//! returns, and the two frame kinds that populate it.

pub mod simple;
pub mod workflow;

pub use simple::{SimpleRequest, SimpleToolFrame};
pub use workflow::{Confidence, Phase, WorkflowEngine, WorkflowState, WorkflowStepArgs};
