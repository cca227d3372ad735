//! Streaming generation: the same agent loop, surfaced as a typed event
//! sequence instead of one blocking answer.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::StreamExt;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::AgentEvent;
use crate::message::Message;
use crate::store::StoredMessage;
use crate::types::{FinalAnswer, Source, ToolCallRecord};

use super::accumulator::ToolCallAccumulator;
use super::orchestrator::{Orchestrator, describe_tool_usage, round_secs};
use super::title;

const STREAM_INIT_MESSAGE: &str =
    "Sorry, the answer could not be started. Please try again.";
const NO_RESPONSE_MESSAGE: &str = "Sorry, no response was received.";
const TOOL_OUTPUT_PREVIEW_CHARS: usize = 500;

impl Orchestrator {
    /// Run the loop in streaming mode. Events arrive on the returned
    /// channel; the sequence ends with exactly one `complete` or `error`.
    /// Dropping the receiver does not abort the run, the answer is still
    /// persisted.
    pub fn generate_stream(
        &self,
        chat_id: &str,
        user_message: &str,
    ) -> flume::Receiver<AgentEvent> {
        let (tx, rx) = flume::unbounded();
        let orchestrator = self.clone();
        let chat_id = chat_id.to_string();
        let user_message = user_message.to_string();
        tokio::spawn(async move {
            orchestrator.run_stream(&chat_id, &user_message, &tx).await;
        });
        rx
    }

    async fn run_stream(
        &self,
        chat_id: &str,
        user_message: &str,
        tx: &flume::Sender<AgentEvent>,
    ) {
        let started = Instant::now();
        let message_id = Uuid::new_v4().to_string();
        let emit = |event: AgentEvent| {
            // A closed receiver only means nobody is watching.
            let _ = tx.send(event);
        };

        self.store.ensure_chat(chat_id, &self.system_prompt).await;
        self.store
            .append(chat_id, StoredMessage::new(Message::user(user_message)))
            .await;
        let is_first_exchange = self.store.message_count(chat_id).await == 2;

        emit(AgentEvent::Start {
            message_id: message_id.clone(),
            chat_id: chat_id.to_string(),
        });

        let specs = self.tools.specs();
        let options = self.chat_options();

        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();
        let mut sources: Vec<Source> = Vec::new();
        let mut reasoning: Option<String> = None;
        let mut final_content: Option<String> = None;

        let mut iteration = 0;
        'rounds: while iteration < self.config.max_iterations {
            iteration += 1;
            debug!(iteration, chat_id, "streaming agent iteration");
            emit(AgentEvent::Iteration {
                iteration,
                max_iterations: self.config.max_iterations,
            });
            emit(AgentEvent::Thinking {
                message: "Thinking...".to_string(),
            });

            let history = self.store.history(chat_id).await;
            let mut stream = match timeout(
                self.config.stream_init_timeout,
                self.llm.chat_stream(&history, &specs, &options),
            )
            .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(error)) => {
                    warn!(%error, "stream could not be opened");
                    self.fail_stream(chat_id, &error.to_string(), &emit).await;
                    return;
                }
                Err(_) => {
                    warn!("stream initialization timed out");
                    final_content = Some(STREAM_INIT_MESSAGE.to_string());
                    break;
                }
            };

            let mut accumulated = String::new();
            let mut content_started = false;
            let mut accumulator = ToolCallAccumulator::new();
            let mut chunk_count: u32 = 0;

            while let Some(delta) = stream.next().await {
                let delta = match delta {
                    Ok(delta) => delta,
                    Err(error) => {
                        warn!(%error, "stream transport error");
                        self.fail_stream(chat_id, &error.to_string(), &emit).await;
                        return;
                    }
                };

                chunk_count += 1;
                if chunk_count > self.config.max_stream_chunks {
                    warn!(
                        max_chunks = self.config.max_stream_chunks,
                        "stream chunk cap reached"
                    );
                    break;
                }

                for fragment in &delta.tool_calls {
                    accumulator.absorb(fragment);
                }

                if let Some(text) = delta.content.as_deref().filter(|text| !text.is_empty()) {
                    if !content_started {
                        content_started = true;
                        emit(AgentEvent::ContentStart {
                            message: "Generating answer...".to_string(),
                        });
                    }
                    accumulated.push_str(text);
                    if accumulated.chars().count() > self.config.max_stream_chars {
                        warn!(
                            max_chars = self.config.max_stream_chars,
                            "stream content cap reached"
                        );
                        break;
                    }
                    emit(AgentEvent::ContentChunk {
                        chunk: text.to_string(),
                    });
                }
            }

            let pending = accumulator.finish();
            if pending.is_empty() {
                final_content = Some(if accumulated.is_empty() {
                    warn!("stream produced neither content nor tool calls");
                    NO_RESPONSE_MESSAGE.to_string()
                } else {
                    accumulated
                });
                break;
            }

            debug!(count = pending.len(), "tool calls detected in stream");
            let invocations: Vec<_> = pending.iter().map(|call| call.to_invocation()).collect();
            self.store
                .append(
                    chat_id,
                    StoredMessage::new(Message::assistant_with_tools(&accumulated, invocations)),
                )
                .await;

            let mut any_success = false;
            for call in &pending {
                let arguments = match call.parse_arguments() {
                    Ok(arguments) => arguments,
                    Err(error) => {
                        warn!(tool = %call.name, %error, "unparseable tool arguments");
                        let record = ToolCallRecord::pending(&call.name, Default::default())
                            .fail(format!("invalid tool arguments: {error}"));
                        emit(AgentEvent::ToolCallError {
                            tool_name: call.name.clone(),
                            error: record.error.clone().unwrap_or_default(),
                        });
                        tool_calls.push(record);
                        continue;
                    }
                };

                emit(AgentEvent::ToolCallStart {
                    tool_name: call.name.clone(),
                    arguments: arguments.clone(),
                });

                let outcome = self.run_tool(&call.name, arguments).await;
                if outcome.record.success {
                    any_success = true;
                    emit(AgentEvent::ToolCallSuccess {
                        tool_name: call.name.clone(),
                        output: preview(
                            outcome.record.output.as_deref().unwrap_or_default(),
                            TOOL_OUTPUT_PREVIEW_CHARS,
                        ),
                    });
                } else {
                    emit(AgentEvent::ToolCallError {
                        tool_name: call.name.clone(),
                        error: outcome.record.error.clone().unwrap_or_default(),
                    });
                }
                sources.extend(outcome.sources);
                if let Some(framed) = outcome.framed {
                    self.store
                        .append(
                            chat_id,
                            StoredMessage::new(Message::tool(&call.name, &framed)),
                        )
                        .await;
                }
                tool_calls.push(outcome.record);
            }

            if !any_success {
                debug!("no successful tool calls, leaving the streaming loop");
                break 'rounds;
            }
            reasoning = Some(describe_tool_usage(&tool_calls));
        }

        let final_content = match final_content {
            Some(content) => content,
            None => self.finalize(chat_id, &options).await,
        };

        self.persist_answer(chat_id, &final_content, &sources, &tool_calls, &reasoning)
            .await;

        emit(AgentEvent::Complete(FinalAnswer {
            message_id,
            role: Message::ASSISTANT.to_string(),
            content: final_content.clone(),
            sources,
            tool_calls,
            reasoning,
            processing_time: round_secs(started.elapsed().as_secs_f64()),
            model_used: self.config.model.clone(),
            timestamp: Utc::now(),
        }));

        if is_first_exchange {
            title::spawn_title_task(
                Arc::clone(&self.llm),
                self.store.clone(),
                self.config.clone(),
                chat_id.to_string(),
                user_message.to_string(),
                final_content,
            );
        }
    }

    /// Terminal error path: persist what happened and emit `error`
    /// instead of `complete`.
    async fn fail_stream(
        &self,
        chat_id: &str,
        error: &str,
        emit: &impl Fn(AgentEvent),
    ) {
        let content = format!("An error occurred while processing the request: {error}");
        self.store
            .append(chat_id, StoredMessage::new(Message::assistant(&content)))
            .await;
        emit(AgentEvent::Error {
            message: content,
            error: error.to_string(),
        });
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
