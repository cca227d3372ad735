//! The search engine proper: gateway orchestration plus the pure ranking
//! pass over raw chunk hits.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::excerpt::{merge_contiguous, preview_window};
use super::lexical::{match_count, query_words};
use super::{RankedDocument, RetrievalError, ScoredChunk, SearchRequest};
use crate::config::RetrievalConfig;
use crate::gateways::{
    ChunkHit, EmbeddingGateway, EmbeddingRole, SearchFilter, VectorSearchGateway,
};

/// Hybrid semantic/lexical document search over one vector collection.
pub struct SearchEngine {
    embedding: Arc<dyn EmbeddingGateway>,
    vectors: Arc<dyn VectorSearchGateway>,
    config: RetrievalConfig,
}

impl SearchEngine {
    pub fn new(
        embedding: Arc<dyn EmbeddingGateway>,
        vectors: Arc<dyn VectorSearchGateway>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedding,
            vectors,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run the full retrieval pipeline for one query.
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<RankedDocument>, RetrievalError> {
        let vectors = self
            .embedding
            .embed(std::slice::from_ref(&request.query), EmbeddingRole::Query)
            .await
            .map_err(RetrievalError::Embed)?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or(RetrievalError::EmptyEmbedding)?;

        let filter = SearchFilter::default()
            .with_document_ids(request.document_ids.clone().unwrap_or_default())
            .with_document_types(request.document_types.clone().unwrap_or_default());
        let filter = (!filter.is_empty()).then_some(filter);

        // Grouping collapses chunk hits into fewer documents; over-fetch so
        // `limit` documents can still be filled.
        let fetch_limit = request.limit * self.config.overfetch_factor;
        let hits = self
            .vectors
            .search(
                &query_vector,
                fetch_limit,
                request.similarity_threshold,
                filter.as_ref(),
            )
            .await
            .map_err(RetrievalError::Search)?;

        let words = query_words(&request.query, self.config.min_word_len);
        debug!(
            query = %request.query,
            raw_hits = hits.len(),
            query_words = words.len(),
            "retrieval: raw vector hits"
        );

        let ranked = rank_hits(hits, &words, request.limit, &self.config);
        debug!(documents = ranked.len(), "retrieval: ranked documents");
        Ok(ranked)
    }
}

/// Group, score, rank, and excerpt raw chunk hits.
///
/// Pure function so ranking semantics are testable without gateways.
pub(crate) fn rank_hits(
    hits: Vec<ChunkHit>,
    words: &[String],
    limit: usize,
    config: &RetrievalConfig,
) -> Vec<RankedDocument> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: FxHashMap<String, DocGroup> = FxHashMap::default();

    for hit in hits {
        let group = groups.entry(hit.document_id.clone()).or_insert_with(|| {
            order.push(hit.document_id.clone());
            DocGroup {
                filename: hit.filename().to_string(),
                document_type: hit.meta_str("document_type").map(str::to_string),
                max_similarity: 0.0,
                chunks: Vec::new(),
            }
        });
        if hit.similarity > group.max_similarity {
            group.max_similarity = hit.similarity;
        }
        if let Some(chunk) = score_chunk(&hit, words, config) {
            group.chunks.push(chunk);
        }
    }

    let mut documents: Vec<RankedDocument> = order
        .into_iter()
        .filter_map(|document_id| {
            let group = groups.remove(&document_id)?;
            group.into_ranked(document_id, words, config)
        })
        .collect();

    // Stable sort keeps first-seen order on ties.
    documents.sort_by(|a, b| {
        b.max_similarity
            .partial_cmp(&a.max_similarity)
            .unwrap_or(Ordering::Equal)
    });
    documents.truncate(limit);
    documents
}

struct DocGroup {
    filename: String,
    document_type: Option<String>,
    max_similarity: f32,
    chunks: Vec<ScoredChunk>,
}

impl DocGroup {
    fn into_ranked(
        self,
        document_id: String,
        words: &[String],
        config: &RetrievalConfig,
    ) -> Option<RankedDocument> {
        if self.chunks.is_empty() {
            return None;
        }

        // Relevance order selects the preview set; the retained listing
        // goes back to reading order.
        let mut by_relevance = self.chunks.clone();
        by_relevance.sort_by(|a, b| {
            b.text_relevance
                .partial_cmp(&a.text_relevance)
                .unwrap_or(Ordering::Equal)
                .then(
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(Ordering::Equal),
                )
        });
        by_relevance.truncate(config.preview_chunks);

        let excerpt = merge_contiguous(&by_relevance);
        let preview = preview_window(
            &excerpt,
            words,
            config.preview_max_len,
            config.preview_lead_in,
        );

        let mut chunks = self.chunks;
        chunks.sort_by_key(|chunk| chunk.chunk_index);

        Some(RankedDocument {
            document_id,
            filename: self.filename,
            document_type: self.document_type,
            max_similarity: self.max_similarity,
            chunk_count: chunks.len(),
            chunks,
            best_chunks: by_relevance,
            preview,
        })
    }
}

/// Lexical relevance pass for one chunk.
///
/// A chunk is retained with `matched / total` relevance when at least one
/// query word occurs in it, or with the configured floor score when its
/// similarity clears the high-confidence threshold despite zero overlap
/// (pure-paraphrase matches must not be dropped by a lexical filter). An
/// empty word list disables the filter entirely.
fn score_chunk(hit: &ChunkHit, words: &[String], config: &RetrievalConfig) -> Option<ScoredChunk> {
    let text_relevance = if words.is_empty() {
        0.0
    } else {
        let matched = match_count(&hit.content.to_lowercase(), words);
        if matched > 0 {
            matched as f32 / words.len() as f32
        } else if hit.similarity > config.high_similarity_floor {
            config.semantic_only_relevance
        } else {
            return None;
        }
    };

    Some(ScoredChunk {
        content: hit.content.clone(),
        similarity: hit.similarity,
        chunk_index: hit.chunk_index,
        text_relevance,
    })
}
