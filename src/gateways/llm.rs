use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GatewayError;
use crate::message::{Message, ToolInvocation};

/// Catalog entry advertising one tool to the language model.
///
/// `parameters` is a JSON Schema object in the shape chat-completion APIs
/// expect; the orchestrator forwards it verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Per-call options forwarded to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// One complete (non-streamed) model turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatTurn {
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ChatTurn {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Index-addressed fragment of a tool call inside a model stream.
///
/// Streaming APIs deliver tool-call arguments in pieces tagged by position;
/// the name typically arrives in the first fragment for that position and
/// the argument JSON accumulates across fragments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolCallFragment {
    pub index: usize,
    pub name: Option<String>,
    pub arguments: String,
}

/// One delta from a streaming model call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatDelta {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
    /// Set on the final delta of the stream.
    pub done: bool,
}

pub type ChatDeltaStream = BoxStream<'static, Result<ChatDelta, GatewayError>>;

/// The language model behind the orchestrator.
///
/// Both entry points receive the full conversation history plus the tool
/// catalog; the model decides per turn whether to answer or request tools.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    /// Single-shot call returning one complete turn.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        options: &ChatOptions,
    ) -> Result<ChatTurn, GatewayError>;

    /// Streaming call yielding partial content and partial tool-call
    /// fragments that the caller accumulates by index.
    async fn chat_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        options: &ChatOptions,
    ) -> Result<ChatDeltaStream, GatewayError>;
}
