use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GatewayError;

/// One scored chunk returned by the vector store.
///
/// `chunk_index` is 0-based and monotonic per document; indices define
/// intra-document reading order independent of similarity. `metadata`
/// carries whatever payload the store indexed alongside the vector
/// (`filename`, `document_type`, rule fields for the rules collection).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    pub document_id: String,
    pub chunk_index: u32,
    pub content: String,
    /// Cosine similarity in `[0, 1]`; higher is more relevant.
    pub similarity: f32,
    #[serde(default)]
    pub metadata: FxHashMap<String, Value>,
}

impl ChunkHit {
    /// Payload field as a string, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Filename from the payload, `"Unknown"` when the store has none.
    pub fn filename(&self) -> &str {
        self.meta_str("filename").unwrap_or("Unknown")
    }
}

/// Conjunctive metadata predicate pushed down to the vector store.
///
/// Both conditions must hold (`AND`) when both are present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchFilter {
    pub document_ids: Option<Vec<String>>,
    pub document_types: Option<Vec<String>>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.document_ids.is_none() && self.document_types.is_none()
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

/// Scored nearest-neighbour search over one vector collection.
///
/// Implementations apply `similarity_threshold` and `filter` server-side and
/// return at most `limit` hits, best first.
#[async_trait]
pub trait VectorSearchGateway: Send + Sync {
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        similarity_threshold: f32,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ChunkHit>, GatewayError>;
}
