//! Narrow interfaces to external collaborators.
//!
//! The engine consumes embedding computation, vector search, the language
//! model, and the relational document catalog exclusively through these
//! traits. Production adapters (HTTP clients, database repositories) live
//! outside this crate; tests substitute scripted implementations.

pub mod catalog;
pub mod embedding;
pub mod llm;
pub mod vector;

use miette::Diagnostic;
use thiserror::Error;

pub use catalog::{DocumentCatalog, DocumentOrder, DocumentQuery, DocumentRecord, DocumentStatus};
pub use embedding::{EmbeddingGateway, EmbeddingRole};
pub use llm::{
    ChatDelta, ChatDeltaStream, ChatOptions, ChatTurn, LanguageModelGateway, ToolCallFragment,
    ToolSpec,
};
pub use vector::{ChunkHit, SearchFilter, VectorSearchGateway};

/// Fault from any external collaborator.
///
/// Gateways collapse their transport-specific failures into these variants;
/// callers decide whether a fault is recoverable (tool error, fallback
/// answer) at the narrowest scope that can still make progress.
#[derive(Debug, Error, Diagnostic)]
pub enum GatewayError {
    #[error("embedding gateway error: {0}")]
    #[diagnostic(code(docent::gateways::embedding))]
    Embedding(String),

    #[error("vector search gateway error: {0}")]
    #[diagnostic(code(docent::gateways::vector_search))]
    VectorSearch(String),

    #[error("language model gateway error: {0}")]
    #[diagnostic(code(docent::gateways::language_model))]
    LanguageModel(String),

    #[error("document catalog error: {0}")]
    #[diagnostic(code(docent::gateways::catalog))]
    Catalog(String),
}
