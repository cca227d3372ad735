use async_trait::async_trait;

use super::GatewayError;

/// Which side of an asymmetric embedding model a text belongs to.
///
/// E5-family models are trained asymmetrically: queries and stored passages
/// must be embedded with different leading markers or similarity scores
/// degrade badly. Implementations prepend [`EmbeddingRole::prefix`] to each
/// text before encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingRole {
    Query,
    Passage,
}

impl EmbeddingRole {
    /// The marker the embedding model expects in front of the raw text.
    pub fn prefix(&self) -> &'static str {
        match self {
            EmbeddingRole::Query => "query: ",
            EmbeddingRole::Passage => "passage: ",
        }
    }

    /// Apply the role marker to a raw text.
    pub fn apply(&self, text: &str) -> String {
        format!("{}{}", self.prefix(), text)
    }
}

/// Turns texts into fixed-length vectors.
///
/// Vectors are expected to be L2-normalized so that dot product equals
/// cosine similarity; the retrieval engine treats returned similarities as
/// cosine scores in `[0, 1]`.
#[async_trait]
pub trait EmbeddingGateway: Send + Sync {
    async fn embed(
        &self,
        texts: &[String],
        role: EmbeddingRole,
    ) -> Result<Vec<Vec<f32>>, GatewayError>;
}
