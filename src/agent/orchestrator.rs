//! Blocking generation: run the agent loop to completion and return one
//! structured answer.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::gateways::{ChatOptions, LanguageModelGateway, ToolSpec};
use crate::message::Message;
use crate::store::{ChatStore, MessageMetadata, StoredMessage};
use crate::tools::{ToolOutput, ToolRegistry};
use crate::types::{FinalAnswer, Source, ToolCallRecord};

use super::prompts::{self, STRICT_RAG_PROMPT};
use super::title;

pub(super) const TIMEOUT_MESSAGE: &str =
    "Sorry, processing this request took too long. Try simplifying the question.";
pub(super) const EMPTY_MESSAGE: &str =
    "Sorry, I could not generate an answer from the retrieved information. \
     Try rephrasing the question.";
pub(super) const TRUNCATION_MARKER: &str = "\n\n[... response truncated due to length ...]";

/// Drives the model/tool loop against an injected store, registry, and
/// model gateway. Cloning shares all of them.
#[derive(Clone)]
pub struct Orchestrator {
    pub(super) llm: Arc<dyn LanguageModelGateway>,
    pub(super) tools: Arc<ToolRegistry>,
    pub(super) store: ChatStore,
    pub(super) config: AgentConfig,
    pub(super) system_prompt: String,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LanguageModelGateway>,
        tools: Arc<ToolRegistry>,
        store: ChatStore,
        config: AgentConfig,
    ) -> Self {
        Self {
            llm,
            tools,
            store,
            config,
            system_prompt: STRICT_RAG_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    pub(super) fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    /// Run the loop to completion for one user message.
    ///
    /// Never fails: timeouts, transport errors, and unproducible answers
    /// are folded into the assistant content so the caller always gets a
    /// well-formed answer with its tool-call records attached.
    pub async fn generate(&self, chat_id: &str, user_message: &str) -> FinalAnswer {
        let started = Instant::now();
        let message_id = Uuid::new_v4().to_string();

        self.store.ensure_chat(chat_id, &self.system_prompt).await;
        self.store
            .append(chat_id, StoredMessage::new(Message::user(user_message)))
            .await;
        // System prompt plus this user turn means the chat just started.
        let is_first_exchange = self.store.message_count(chat_id).await == 2;

        let specs = self.tools.specs();
        let options = self.chat_options();

        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();
        let mut sources: Vec<Source> = Vec::new();
        let mut reasoning: Option<String> = None;
        let mut final_content: Option<String> = None;

        let mut iteration = 0;
        while iteration < self.config.max_iterations {
            iteration += 1;
            debug!(
                iteration,
                max_iterations = self.config.max_iterations,
                chat_id,
                "agent iteration"
            );

            let history = self.store.history(chat_id).await;
            let turn = match timeout(
                self.config.llm_timeout,
                self.llm.chat(&history, &specs, &options),
            )
            .await
            {
                Ok(Ok(turn)) => turn,
                Ok(Err(error)) => {
                    warn!(%error, "model call failed");
                    // Keep the tool-usage summary from earlier rounds.
                    let note = format!("Error occurred: {error}");
                    reasoning = Some(match reasoning.take() {
                        Some(summary) => format!("{summary}. {note}"),
                        None => note,
                    });
                    final_content = Some(format!(
                        "An error occurred while processing the request: {error}"
                    ));
                    break;
                }
                Err(_) => {
                    warn!(timeout = ?self.config.llm_timeout, "model call timed out");
                    final_content = Some(TIMEOUT_MESSAGE.to_string());
                    break;
                }
            };

            if !turn.requests_tools() {
                debug!("no tool calls, final response generated");
                final_content = Some(if turn.content.is_empty() {
                    EMPTY_MESSAGE.to_string()
                } else {
                    turn.content
                });
                break;
            }

            debug!(count = turn.tool_calls.len(), "tool calls requested");
            self.store
                .append(
                    chat_id,
                    StoredMessage::new(Message::assistant_with_tools(
                        &turn.content,
                        turn.tool_calls.clone(),
                    )),
                )
                .await;

            let mut any_success = false;
            for invocation in &turn.tool_calls {
                let outcome = self
                    .run_tool(&invocation.name, invocation.arguments.clone())
                    .await;
                if outcome.record.success {
                    any_success = true;
                }
                sources.extend(outcome.sources);
                if let Some(framed) = outcome.framed {
                    self.store
                        .append(
                            chat_id,
                            StoredMessage::new(Message::tool(&invocation.name, &framed)),
                        )
                        .await;
                }
                tool_calls.push(outcome.record);
            }

            if !any_success {
                debug!("no successful tool calls, leaving the loop");
                break;
            }
            reasoning = Some(describe_tool_usage(&tool_calls));
        }

        // Tool rounds ended without a spoken answer (iteration cap, or a
        // round where every call failed): one tool-free call lets the
        // model answer from what is already in the history.
        let final_content = match final_content {
            Some(content) => content,
            None => self.finalize(chat_id, &options).await,
        };

        self.persist_answer(chat_id, &final_content, &sources, &tool_calls, &reasoning)
            .await;

        if is_first_exchange {
            title::spawn_title_task(
                Arc::clone(&self.llm),
                self.store.clone(),
                self.config.clone(),
                chat_id.to_string(),
                user_message.to_string(),
                final_content.clone(),
            );
        }

        FinalAnswer {
            message_id,
            role: Message::ASSISTANT.to_string(),
            content: final_content,
            sources,
            tool_calls,
            reasoning,
            processing_time: round_secs(started.elapsed().as_secs_f64()),
            model_used: self.config.model.clone(),
            timestamp: Utc::now(),
        }
    }

    pub(super) async fn finalize(&self, chat_id: &str, options: &ChatOptions) -> String {
        let history = self.store.history(chat_id).await;
        let no_tools: [ToolSpec; 0] = [];
        match timeout(
            self.config.llm_timeout,
            self.llm.chat(&history, &no_tools, options),
        )
        .await
        {
            Ok(Ok(turn)) if !turn.content.is_empty() => turn.content,
            Ok(Ok(_)) => EMPTY_MESSAGE.to_string(),
            Ok(Err(error)) => {
                warn!(%error, "finalization call failed");
                EMPTY_MESSAGE.to_string()
            }
            Err(_) => {
                warn!("finalization call timed out");
                TIMEOUT_MESSAGE.to_string()
            }
        }
    }

    pub(super) async fn persist_answer(
        &self,
        chat_id: &str,
        content: &str,
        sources: &[Source],
        tool_calls: &[ToolCallRecord],
        reasoning: &Option<String>,
    ) {
        let metadata = MessageMetadata {
            sources: sources.to_vec(),
            tool_calls: tool_calls.to_vec(),
            reasoning: reasoning.clone(),
        };
        debug!(
            sources = sources.len(),
            tool_calls = tool_calls.len(),
            "saving assistant message"
        );
        self.store
            .append(
                chat_id,
                StoredMessage::with_metadata(Message::assistant(content), metadata),
            )
            .await;
    }

    /// Execute one tool call. Missing tools and tool failures become
    /// failed records, never errors.
    pub(super) async fn run_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> ToolRunOutcome {
        let record = ToolCallRecord::pending(name, arguments.clone());
        let Some(tool) = self.tools.resolve(name) else {
            warn!(tool = name, "tool not found");
            return ToolRunOutcome::failed(record.fail(format!("Function {name} not found")));
        };

        debug!(tool = name, "calling tool");
        match tool.call(&arguments).await {
            Ok(output) => {
                let mut sources = Vec::new();
                if let ToolOutput::Retrieval { documents, .. } = &output {
                    for doc in documents {
                        for chunk in &doc.best_chunks {
                            sources.push(Source {
                                filename: doc.filename.clone(),
                                content: chunk.content.clone(),
                                similarity: chunk.similarity,
                                chunk_index: chunk.chunk_index,
                            });
                        }
                    }
                }

                let rendered = output.into_rendered();
                let framed = prompts::frame_tool_output(&truncate_output(
                    &rendered,
                    self.config.max_tool_output_chars,
                ));
                ToolRunOutcome {
                    record: record.succeed(rendered),
                    framed: Some(framed),
                    sources,
                }
            }
            Err(error) => {
                warn!(tool = name, %error, "tool call failed");
                ToolRunOutcome::failed(record.fail(error.to_string()))
            }
        }
    }
}

pub(super) struct ToolRunOutcome {
    pub record: ToolCallRecord,
    pub framed: Option<String>,
    pub sources: Vec<Source>,
}

impl ToolRunOutcome {
    fn failed(record: ToolCallRecord) -> Self {
        Self {
            record,
            framed: None,
            sources: Vec::new(),
        }
    }
}

/// Clip tool output for the conversation history. Operates on chars so
/// the cut never lands inside a multi-byte sequence.
pub(super) fn truncate_output(rendered: &str, max_chars: usize) -> String {
    if rendered.chars().count() <= max_chars {
        return rendered.to_string();
    }
    let mut out: String = rendered.chars().take(max_chars).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

pub(super) fn describe_tool_usage(records: &[ToolCallRecord]) -> String {
    let successful: Vec<&str> = records
        .iter()
        .filter(|record| record.success)
        .map(|record| record.name.as_str())
        .collect();
    format!(
        "Used {} tool(s) to gather information: {}",
        successful.len(),
        successful.join(", ")
    )
}

pub(super) fn round_secs(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
