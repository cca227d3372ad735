//! Typed event vocabulary for streaming answer generation.
//!
//! An orchestrator run in streaming mode emits an append-only sequence of
//! [`AgentEvent`]s terminated by exactly one `complete` or `error`. Each
//! event serializes to a single JSON object carrying a `type` discriminator,
//! suitable for one-way server push.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::FinalAnswer;

/// One event in a streaming generation run.
///
/// Ordering contract: `start` first, then repeated rounds of `iteration`,
/// `thinking`, optional `content_start`, zero-or-more `content_chunk` and
/// tool-call events, ending in exactly one of `complete` or `error`.
/// Consumers must treat `complete`/`error` as terminal.
///
/// # Example
///
/// ```
/// use docent::events::AgentEvent;
///
/// let event = AgentEvent::Iteration { iteration: 1, max_iterations: 5 };
/// let json = event.to_json_string().unwrap();
/// assert!(json.contains("\"type\":\"iteration\""));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Start {
        message_id: String,
        chat_id: String,
    },
    Iteration {
        iteration: u32,
        max_iterations: u32,
    },
    Thinking {
        message: String,
    },
    ContentStart {
        message: String,
    },
    ContentChunk {
        chunk: String,
    },
    ToolCallStart {
        tool_name: String,
        arguments: Map<String, Value>,
    },
    ToolCallSuccess {
        tool_name: String,
        /// Preview of the tool output, truncated to a display-friendly size.
        output: String,
    },
    ToolCallError {
        tool_name: String,
        error: String,
    },
    Complete(FinalAnswer),
    Error {
        message: String,
        error: String,
    },
}

impl AgentEvent {
    /// True for the two terminal event kinds.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Complete(_) | AgentEvent::Error { .. })
    }

    /// Discriminator string matching the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Start { .. } => "start",
            AgentEvent::Iteration { .. } => "iteration",
            AgentEvent::Thinking { .. } => "thinking",
            AgentEvent::ContentStart { .. } => "content_start",
            AgentEvent::ContentChunk { .. } => "content_chunk",
            AgentEvent::ToolCallStart { .. } => "tool_call_start",
            AgentEvent::ToolCallSuccess { .. } => "tool_call_success",
            AgentEvent::ToolCallError { .. } => "tool_call_error",
            AgentEvent::Complete(_) => "complete",
            AgentEvent::Error { .. } => "error",
        }
    }

    /// Convert the event to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Render the event as a Server-Sent Events frame (`data: <json>\n\n`).
    pub fn to_sse_frame(&self) -> Result<String, serde_json::Error> {
        Ok(format!("data: {}\n\n", self.to_json_string()?))
    }
}

impl fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentEvent::ContentChunk { chunk } => write!(f, "[{}] {chunk}", self.kind()),
            AgentEvent::ToolCallStart { tool_name, .. }
            | AgentEvent::ToolCallSuccess { tool_name, .. }
            | AgentEvent::ToolCallError { tool_name, .. } => {
                write!(f, "[{}] {tool_name}", self.kind())
            }
            AgentEvent::Error { message, .. } => write!(f, "[error] {message}"),
            other => write!(f, "[{}]", other.kind()),
        }
    }
}
