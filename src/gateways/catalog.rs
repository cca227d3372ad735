use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GatewayError;

/// Processing state of an ingested document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Processing => "PROCESSING",
            DocumentStatus::Completed => "COMPLETED",
            DocumentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "PENDING" => Some(DocumentStatus::Pending),
            "PROCESSING" => Some(DocumentStatus::Processing),
            "COMPLETED" => Some(DocumentStatus::Completed),
            "FAILED" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document's relational record, as stored by the ingestion pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub status: DocumentStatus,
    /// Extracted full text; `None` when extraction has not completed.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn content_len(&self) -> usize {
        self.content.as_deref().map_or(0, str::len)
    }
}

/// Sort order for catalog queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentOrder {
    /// Newest first.
    CreatedAt,
    /// Case-insensitive filename ascending.
    Filename,
    /// Longest extracted content first.
    ContentLength,
    /// Status name ascending.
    Status,
}

impl DocumentOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created_at" => Some(DocumentOrder::CreatedAt),
            "filename" => Some(DocumentOrder::Filename),
            "content_length" => Some(DocumentOrder::ContentLength),
            "status" => Some(DocumentOrder::Status),
            _ => None,
        }
    }
}

/// Conjunctive filter set for catalog queries; `None` fields do not filter.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentQuery {
    pub status: Option<DocumentStatus>,
    pub content_type: Option<String>,
    pub filename_contains: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub min_content_length: Option<usize>,
    pub max_content_length: Option<usize>,
    pub order_by: Option<DocumentOrder>,
    pub limit: Option<usize>,
}

/// Read access to the relational document store.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Option<DocumentRecord>, GatewayError>;

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<DocumentRecord>, GatewayError>;
}
