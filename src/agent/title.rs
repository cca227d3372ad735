//! Background chat-title generation after the first exchange.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::AgentConfig;
use crate::gateways::{ChatOptions, LanguageModelGateway};
use crate::message::Message;
use crate::store::ChatStore;

use super::prompts;

const TITLE_TEMPERATURE: f32 = 0.7;

/// Fire-and-forget: title failures never affect the answer.
pub(super) fn spawn_title_task(
    llm: Arc<dyn LanguageModelGateway>,
    store: ChatStore,
    config: AgentConfig,
    chat_id: String,
    user_message: String,
    assistant_response: String,
) {
    tokio::spawn(async move {
        let prompt = prompts::title_prompt(&user_message, &assistant_response);
        let messages = [Message::user(&prompt)];
        let options = ChatOptions {
            model: config.title_model.clone(),
            temperature: TITLE_TEMPERATURE,
            max_tokens: config.max_tokens,
        };
        let turn = match timeout(config.llm_timeout, llm.chat(&messages, &[], &options)).await {
            Ok(Ok(turn)) => turn,
            Ok(Err(error)) => {
                warn!(%error, chat_id, "title generation failed");
                return;
            }
            Err(_) => {
                warn!(chat_id, "title generation timed out");
                return;
            }
        };

        let title = clean_title(&turn.content, config.title_max_len);
        if title.is_empty() {
            return;
        }
        debug!(chat_id, title, "generated chat title");
        store.set_title(&chat_id, title).await;
    });
}

/// Strip surrounding whitespace and quotes, then clip to the limit.
pub(super) fn clean_title(raw: &str, max_len: usize) -> String {
    let trimmed = raw.trim().trim_matches(['"', '\'']).trim();
    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }
    let mut clipped: String = trimmed.chars().take(max_len).collect();
    clipped.push_str("...");
    clipped
}
