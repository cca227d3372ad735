use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message in a conversation, containing a role and text content.
///
/// Messages are the primary data structure the orchestrator feeds to the
/// language model: the system prompt, user turns, assistant replies, and
/// tool outputs all travel as `Message` values. Tool-role messages carry the
/// name of the tool that produced them; assistant messages that requested
/// tools carry the invocations so history replays faithfully.
///
/// # Examples
///
/// ```
/// use docent::message::Message;
///
/// let user_msg = Message::user("Who owns the vessel?");
/// let assistant_msg = Message::assistant("The registered owner is …");
/// let system_msg = Message::system("You are a grounded assistant.");
/// let tool_msg = Message::tool("search_documents", "Found 2 documents …");
///
/// assert!(tool_msg.has_role(Message::TOOL));
/// assert_eq!(tool_msg.tool_name.as_deref(), Some("search_documents"));
/// ```
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender.
    ///
    /// Use the constants on [`Message`] for standardized values.
    pub role: String,
    /// The text content of the message.
    pub content: String,
    /// Name of the tool that produced this message, for tool-role messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool invocations requested in this turn, for assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

/// A single tool invocation requested by the language model: a tool name and
/// an untyped key→value argument map. Schema validation is the tool's job.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl Message {
    /// User input message role.
    pub const USER: &'static str = "user";
    /// AI assistant response message role.
    pub const ASSISTANT: &'static str = "assistant";
    /// System prompt or instruction message role.
    pub const SYSTEM: &'static str = "system";
    /// Tool output message role.
    pub const TOOL: &'static str = "tool";

    /// Creates a new message with the specified role and content.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            tool_name: None,
            tool_calls: Vec::new(),
        }
    }

    /// Creates a user message with the specified content.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::new(Self::USER, content)
    }

    /// Creates an assistant message with the specified content.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::new(Self::ASSISTANT, content)
    }

    /// Creates an assistant message that carries tool invocations.
    ///
    /// Content may be empty: models frequently request tools without
    /// emitting any prose in the same turn.
    #[must_use]
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: Self::ASSISTANT.to_string(),
            content: content.to_string(),
            tool_name: None,
            tool_calls,
        }
    }

    /// Creates a system message with the specified content.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::new(Self::SYSTEM, content)
    }

    /// Creates a tool-role message attributed to the named tool.
    #[must_use]
    pub fn tool(tool_name: &str, content: &str) -> Self {
        Self {
            role: Self::TOOL.to_string(),
            content: content.to_string(),
            tool_name: Some(tool_name.to_string()),
            tool_calls: Vec::new(),
        }
    }

    /// Returns true if this message has the specified role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Returns true if this message carries at least one tool invocation.
    #[must_use]
    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
