//! The conversation orchestrator: the agent loop that alternates model
//! turns with tool execution until a grounded answer is produced.

pub mod accumulator;
pub mod orchestrator;
pub mod prompts;
mod streaming;
mod title;

pub use accumulator::{PendingToolCall, ToolCallAccumulator};
pub use orchestrator::Orchestrator;
