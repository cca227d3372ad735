//! In-memory conversation storage.
//!
//! Each chat owns its own lock, so appends to different chats never
//! contend and appends to the same chat are serialized in arrival order.
//! The store is cheap to clone and is injected into the orchestrator
//! rather than reached through any global state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::message::Message;
use crate::types::{Source, ToolCallRecord};

/// Per-message annotations produced by the agent loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.tool_calls.is_empty() && self.reasoning.is_none()
    }
}

/// A message as persisted in a chat, with its arrival time and any
/// agent-produced metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(flatten)]
    pub message: Message,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl StoredMessage {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(message: Message, metadata: MessageMetadata) -> Self {
        Self {
            message,
            timestamp: Utc::now(),
            metadata: (!metadata.is_empty()).then_some(metadata),
        }
    }
}

/// One conversation: identity, title, and the ordered message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub chat_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<StoredMessage>,
}

impl ChatSession {
    fn new(chat_id: String) -> Self {
        let now = Utc::now();
        Self {
            chat_id,
            title: None,
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }
}

/// Listing row for a chat, without the message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Handle to the shared chat map. Clones share the same storage.
#[derive(Clone, Default)]
pub struct ChatStore {
    chats: Arc<Mutex<FxHashMap<String, Arc<Mutex<ChatSession>>>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh chat with a generated id and return the id.
    pub async fn create_chat(&self) -> String {
        let chat_id = Uuid::new_v4().to_string();
        let mut chats = self.chats.lock().await;
        chats.insert(
            chat_id.clone(),
            Arc::new(Mutex::new(ChatSession::new(chat_id.clone()))),
        );
        chat_id
    }

    /// Return the chat's lock, creating the chat on first use. A newly
    /// created chat is seeded with the system prompt so the model sees it
    /// before any user turn.
    pub async fn ensure_chat(
        &self,
        chat_id: &str,
        system_prompt: &str,
    ) -> Arc<Mutex<ChatSession>> {
        let mut chats = self.chats.lock().await;
        if let Some(chat) = chats.get(chat_id) {
            return Arc::clone(chat);
        }
        let mut session = ChatSession::new(chat_id.to_string());
        session
            .messages
            .push(StoredMessage::new(Message::system(system_prompt)));
        let chat = Arc::new(Mutex::new(session));
        chats.insert(chat_id.to_string(), Arc::clone(&chat));
        chat
    }

    async fn get(&self, chat_id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        let chats = self.chats.lock().await;
        chats.get(chat_id).map(Arc::clone)
    }

    /// Append a message to an existing chat. Returns false when the chat
    /// does not exist.
    pub async fn append(&self, chat_id: &str, stored: StoredMessage) -> bool {
        let Some(chat) = self.get(chat_id).await else {
            return false;
        };
        let mut session = chat.lock().await;
        session.updated_at = stored.timestamp;
        session.messages.push(stored);
        true
    }

    /// Snapshot of the plain message log, metadata stripped, in order.
    pub async fn history(&self, chat_id: &str) -> Vec<Message> {
        match self.get(chat_id).await {
            Some(chat) => {
                let session = chat.lock().await;
                session
                    .messages
                    .iter()
                    .map(|stored| stored.message.clone())
                    .collect()
            }
            None => Vec::new(),
        }
    }

    pub async fn message_count(&self, chat_id: &str) -> usize {
        match self.get(chat_id).await {
            Some(chat) => chat.lock().await.messages.len(),
            None => 0,
        }
    }

    pub async fn set_title(&self, chat_id: &str, title: impl Into<String>) -> bool {
        let Some(chat) = self.get(chat_id).await else {
            return false;
        };
        let mut session = chat.lock().await;
        session.title = Some(title.into());
        session.updated_at = Utc::now();
        true
    }

    /// Full snapshot of one chat.
    pub async fn get_chat(&self, chat_id: &str) -> Option<ChatSession> {
        let chat = self.get(chat_id).await?;
        let session = chat.lock().await;
        Some(session.clone())
    }

    /// All chats, most recently updated first.
    pub async fn list_chats(&self) -> Vec<ChatSummary> {
        let chats: Vec<Arc<Mutex<ChatSession>>> = {
            let map = self.chats.lock().await;
            map.values().map(Arc::clone).collect()
        };
        let mut summaries = Vec::with_capacity(chats.len());
        for chat in chats {
            let session = chat.lock().await;
            summaries.push(ChatSummary {
                chat_id: session.chat_id.clone(),
                title: session.title.clone(),
                created_at: session.created_at,
                updated_at: session.updated_at,
                message_count: session.messages.len(),
            });
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    pub async fn delete_chat(&self, chat_id: &str) -> bool {
        let mut chats = self.chats.lock().await;
        chats.remove(chat_id).is_some()
    }
}
