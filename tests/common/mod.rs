//! Scripted gateway and tool doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use serde_json::{Map, Value, json};

use docent::gateways::{
    ChatDelta, ChatDeltaStream, ChatOptions, ChatTurn, ChunkHit, EmbeddingGateway, EmbeddingRole,
    GatewayError, LanguageModelGateway, SearchFilter, ToolCallFragment, ToolSpec,
    VectorSearchGateway,
};
use docent::message::{Message, ToolInvocation};
use docent::retrieval::RankedDocument;
use docent::tools::{Tool, ToolError, ToolOutput};
use rustc_hash::FxHashMap;

/// One scripted response for a blocking chat call.
pub enum TurnScript {
    Reply(ChatTurn),
    Fail(String),
    /// Never resolves within any sane test timeout.
    Hang,
}

/// One scripted delta inside a scripted stream.
pub enum DeltaScript {
    Content(&'static str),
    Fragment(ToolCallFragment),
    Fail(String),
}

/// One scripted response for a streaming chat call.
pub enum StreamScript {
    Deltas(Vec<DeltaScript>),
    FailOpen(String),
    HangOpen,
}

/// Language model double that replays scripted turns and streams.
#[derive(Default)]
pub struct ScriptedLlm {
    turns: Mutex<VecDeque<TurnScript>>,
    streams: Mutex<VecDeque<StreamScript>>,
    pub chat_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_turn(&self, script: TurnScript) -> &Self {
        self.turns.lock().unwrap().push_back(script);
        self
    }

    pub fn push_reply(&self, turn: ChatTurn) -> &Self {
        self.push_turn(TurnScript::Reply(turn))
    }

    pub fn push_stream(&self, script: StreamScript) -> &Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    pub fn chat_call_count(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn stream_call_count(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedLlm {
    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
        _options: &ChatOptions,
    ) -> Result<ChatTurn, GatewayError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.turns.lock().unwrap().pop_front();
        match script {
            Some(TurnScript::Reply(turn)) => Ok(turn),
            Some(TurnScript::Fail(reason)) => Err(GatewayError::LanguageModel(reason)),
            Some(TurnScript::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::LanguageModel("unreachable".to_string()))
            }
            None => Err(GatewayError::LanguageModel(
                "no scripted turn left".to_string(),
            )),
        }
    }

    async fn chat_stream(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
        _options: &ChatOptions,
    ) -> Result<ChatDeltaStream, GatewayError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.streams.lock().unwrap().pop_front();
        match script {
            Some(StreamScript::Deltas(deltas)) => {
                let items: Vec<Result<ChatDelta, GatewayError>> = deltas
                    .into_iter()
                    .map(|delta| match delta {
                        DeltaScript::Content(text) => Ok(ChatDelta {
                            content: Some(text.to_string()),
                            ..ChatDelta::default()
                        }),
                        DeltaScript::Fragment(fragment) => Ok(ChatDelta {
                            tool_calls: vec![fragment],
                            ..ChatDelta::default()
                        }),
                        DeltaScript::Fail(reason) => Err(GatewayError::LanguageModel(reason)),
                    })
                    .collect();
                Ok(stream::iter(items).boxed())
            }
            Some(StreamScript::FailOpen(reason)) => Err(GatewayError::LanguageModel(reason)),
            Some(StreamScript::HangOpen) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::LanguageModel("unreachable".to_string()))
            }
            None => Err(GatewayError::LanguageModel(
                "no scripted stream left".to_string(),
            )),
        }
    }
}

/// Catalog double applying the query filters in memory.
pub struct StaticCatalog {
    records: Vec<docent::gateways::DocumentRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<docent::gateways::DocumentRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl docent::gateways::DocumentCatalog for StaticCatalog {
    async fn fetch(
        &self,
        id: &str,
    ) -> Result<Option<docent::gateways::DocumentRecord>, GatewayError> {
        Ok(self.records.iter().find(|record| record.id == id).cloned())
    }

    async fn query(
        &self,
        query: &docent::gateways::DocumentQuery,
    ) -> Result<Vec<docent::gateways::DocumentRecord>, GatewayError> {
        use docent::gateways::DocumentOrder;

        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|record| {
                query.status.is_none_or(|status| record.status == status)
                    && query
                        .content_type
                        .as_deref()
                        .is_none_or(|ct| record.content_type == ct)
                    && query.filename_contains.as_deref().is_none_or(|needle| {
                        record
                            .filename
                            .to_lowercase()
                            .contains(&needle.to_lowercase())
                    })
                    && query.created_after.is_none_or(|after| record.created_at >= after)
                    && query
                        .created_before
                        .is_none_or(|before| record.created_at <= before)
                    && query
                        .min_content_length
                        .is_none_or(|min| record.content_len() >= min)
                    && query
                        .max_content_length
                        .is_none_or(|max| record.content_len() <= max)
            })
            .cloned()
            .collect();

        match query.order_by {
            Some(DocumentOrder::CreatedAt) => {
                records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
            Some(DocumentOrder::Filename) => {
                records.sort_by(|a, b| a.filename.to_lowercase().cmp(&b.filename.to_lowercase()));
            }
            Some(DocumentOrder::ContentLength) => {
                records.sort_by(|a, b| b.content_len().cmp(&a.content_len()));
            }
            Some(DocumentOrder::Status) => {
                records.sort_by_key(|record| record.status.as_str());
            }
            None => {}
        }
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }
}

/// Embedding double returning one fixed vector per input text.
pub struct StaticEmbedding;

#[async_trait]
impl EmbeddingGateway for StaticEmbedding {
    async fn embed(
        &self,
        texts: &[String],
        _role: EmbeddingRole,
    ) -> Result<Vec<Vec<f32>>, GatewayError> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3, 0.4]).collect())
    }
}

/// Vector search double serving a fixed hit list, threshold-filtered and
/// limit-truncated like the real store. Records the last request for
/// assertions.
pub struct StaticVectors {
    hits: Vec<ChunkHit>,
    pub last_limit: Mutex<Option<usize>>,
    pub last_filter: Mutex<Option<SearchFilter>>,
}

impl StaticVectors {
    pub fn new(hits: Vec<ChunkHit>) -> Self {
        Self {
            hits,
            last_limit: Mutex::new(None),
            last_filter: Mutex::new(None),
        }
    }
}

#[async_trait]
impl VectorSearchGateway for StaticVectors {
    async fn search(
        &self,
        _vector: &[f32],
        limit: usize,
        similarity_threshold: f32,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChunkHit>, GatewayError> {
        *self.last_limit.lock().unwrap() = Some(limit);
        *self.last_filter.lock().unwrap() = filter.cloned();
        let mut hits: Vec<ChunkHit> = self
            .hits
            .iter()
            .filter(|hit| hit.similarity >= similarity_threshold)
            .cloned()
            .collect();
        hits.truncate(limit);
        Ok(hits)
    }
}

pub fn hit(document_id: &str, filename: &str, chunk_index: u32, similarity: f32, content: &str) -> ChunkHit {
    let mut metadata = FxHashMap::default();
    metadata.insert("filename".to_string(), json!(filename));
    ChunkHit {
        document_id: document_id.to_string(),
        chunk_index,
        content: content.to_string(),
        similarity,
        metadata,
    }
}

pub fn tool_request(name: &str, arguments: Value) -> ChatTurn {
    let arguments = match arguments {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ChatTurn {
        content: String::new(),
        tool_calls: vec![ToolInvocation::new(name, arguments)],
    }
}

/// Tool double that always succeeds with fixed text.
pub struct EchoTool {
    pub output: String,
}

impl EchoTool {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "echo".to_string(),
            description: "repeat fixed text".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    async fn call(&self, _arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::Text(self.output.clone()))
    }
}

/// Tool double that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "failing".to_string(),
            description: "always fails".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    async fn call(&self, _arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        Err(ToolError::InvalidArgument {
            name: "query",
            reason: "scripted failure".to_string(),
        })
    }
}

/// Tool double returning a retrieval result with the given documents.
pub struct RetrievalTool {
    pub documents: Vec<RankedDocument>,
    pub rendered: String,
}

#[async_trait]
impl Tool for RetrievalTool {
    fn name(&self) -> &'static str {
        "search_documents"
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "search_documents".to_string(),
            description: "scripted retrieval".to_string(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    async fn call(&self, _arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::Retrieval {
            documents: self.documents.clone(),
            rendered: self.rendered.clone(),
        })
    }
}
