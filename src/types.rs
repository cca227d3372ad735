//! Answer-facing records produced by an orchestrator run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A document excerpt that grounded part of an answer.
///
/// Derived from successful retrieval tool calls and attached, read-only, to
/// the assistant message metadata and the final answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub filename: String,
    pub content: String,
    /// Cosine similarity against the query embedding, in `[0, 1]`.
    pub similarity: f32,
    pub chunk_index: u32,
}

/// Record of one tool invocation attempt.
///
/// `success == false` implies `output` is `None` and `error` is `Some`.
/// Records are never mutated after the outcome is captured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallRecord {
    /// A pending record for an invocation whose outcome is not yet known.
    pub fn pending(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
            output: None,
            success: false,
            error: None,
        }
    }

    pub fn succeed(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self.success = true;
        self.error = None;
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.output = None;
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// The complete, grounded answer for one user turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub message_id: String,
    pub role: String,
    pub content: String,
    pub sources: Vec<Source>,
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Wall-clock time spent on this turn, in seconds, rounded to 2 places.
    pub processing_time: f64,
    pub model_used: String,
    pub timestamp: DateTime<Utc>,
}
