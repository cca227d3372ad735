//! Hybrid retrieval & ranking engine.
//!
//! Turns a natural-language query into a ranked, deduplicated list of
//! document-level results by combining vector similarity with lexical
//! word-overlap relevance, then assembling coherent excerpts from
//! contiguous chunks.
//!
//! Pipeline: embed query (query-role marker) → over-fetched vector search
//! with pushed-down filters → group chunk hits by document → lexical
//! relevance pass → per-document chunk ordering → contiguous-chunk excerpt
//! merge → preview windowing → document-level ranking by peak similarity.

pub mod engine;
pub mod excerpt;
pub mod lexical;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateways::GatewayError;

pub use engine::SearchEngine;
pub use excerpt::{ELLIPSIS, GAP_MARKER};

/// A retained chunk of a ranked document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub content: String,
    /// Cosine similarity against the query, in `[0, 1]`.
    pub similarity: f32,
    pub chunk_index: u32,
    /// Fraction of query words found in this chunk; chunks kept only by the
    /// high-similarity exception carry the configured floor score instead.
    pub text_relevance: f32,
}

/// One document-level result, built per query and never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedDocument {
    pub document_id: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    /// Peak similarity across the document's retained chunks.
    pub max_similarity: f32,
    /// Total retained chunks (also the length of `chunks`).
    pub chunk_count: usize,
    /// Retained chunks in reading order (chunk index ascending).
    pub chunks: Vec<ScoredChunk>,
    /// The top chunks in relevance order, the set the preview was built
    /// from; source extraction uses these.
    pub best_chunks: Vec<ScoredChunk>,
    /// Windowed excerpt assembled from `best_chunks`.
    pub preview: String,
}

/// Parameters for one retrieval query.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Maximum documents returned.
    pub limit: usize,
    /// Minimum similarity for raw chunk hits, in `[0, 1]`.
    pub similarity_threshold: f32,
    pub document_ids: Option<Vec<String>>,
    pub document_types: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 10,
            similarity_threshold: 0.7,
            document_ids: None,
            document_types: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_document_ids(mut self, ids: Vec<String>) -> Self {
        self.document_ids = (!ids.is_empty()).then_some(ids);
        self
    }

    #[must_use]
    pub fn with_document_types(mut self, types: Vec<String>) -> Self {
        self.document_types = (!types.is_empty()).then_some(types);
        self
    }
}

/// Failures from the direct `search` entry point.
///
/// When retrieval runs inside a tool, these surface as a tool execution
/// failure instead and never abort the conversation.
#[derive(Debug, Error, Diagnostic)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    #[diagnostic(code(docent::retrieval::embed))]
    Embed(#[source] GatewayError),

    #[error("vector search failed: {0}")]
    #[diagnostic(code(docent::retrieval::search))]
    Search(#[source] GatewayError),

    #[error("embedding gateway returned no vector for the query")]
    #[diagnostic(code(docent::retrieval::empty_embedding))]
    EmptyEmbedding,
}
