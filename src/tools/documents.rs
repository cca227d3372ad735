//! Document-facing tools: semantic search, metadata lookup, paginated
//! content reads, and catalog queries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::gateways::{DocumentCatalog, DocumentOrder, DocumentRecord, DocumentStatus, ToolSpec};
use crate::retrieval::{RankedDocument, SearchEngine, SearchRequest};

use super::{
    Tool, ToolError, ToolOutput, clip_chars, optional_bool, optional_f32, optional_str,
    optional_str_list, optional_usize, require_str,
};

const CONTENT_PREVIEW_CHARS: usize = 2000;
const DEFAULT_PAGE_CHARS: usize = 3000;

/// Semantic search over the document collection.
pub struct SearchDocumentsTool {
    engine: Arc<SearchEngine>,
}

impl SearchDocumentsTool {
    pub const NAME: &'static str = "search_documents";

    pub fn new(engine: Arc<SearchEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for SearchDocumentsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Search for relevant documents using semantic vector search. \
                          Returns ranked documents with previews and document IDs for \
                          follow-up retrieval. Be specific and descriptive in the query."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language search query"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of documents to return (default 10)"
                    },
                    "similarity_threshold": {
                        "type": "number",
                        "description": "Minimum cosine similarity for chunk hits"
                    },
                    "document_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Restrict the search to these document IDs"
                    },
                    "document_types": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Restrict the search to these document types"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let query = require_str(arguments, "query")?;

        let mut request = SearchRequest::new(query);
        if let Some(limit) = optional_usize(arguments, "limit")? {
            request = request.with_limit(limit.max(1));
        }
        if let Some(threshold) = optional_f32(arguments, "similarity_threshold")? {
            request = request.with_similarity_threshold(threshold);
        }
        if let Some(ids) = optional_str_list(arguments, "document_ids")? {
            request = request.with_document_ids(ids);
        }
        if let Some(types) = optional_str_list(arguments, "document_types")? {
            request = request.with_document_types(types);
        }

        let documents = self.engine.search(&request).await?;
        debug!(
            query = %request.query,
            documents = documents.len(),
            "search_documents completed"
        );
        let rendered = render_search_report(&request.query, &documents);
        Ok(ToolOutput::Retrieval {
            documents,
            rendered,
        })
    }
}

fn render_search_report(query: &str, documents: &[RankedDocument]) -> String {
    if documents.is_empty() {
        return format!("No documents found matching query: '{query}'");
    }
    let mut out = format!("Found {} documents matching '{query}':\n\n", documents.len());
    for (i, doc) in documents.iter().enumerate() {
        let size: usize = doc.chunks.iter().map(|chunk| chunk.content.len()).sum();
        out.push_str(&format!("{}. {}\n", i + 1, doc.filename));
        out.push_str(&format!(
            "   ID: {} | Size: {} bytes | Chunks: {}\n",
            doc.document_id, size, doc.chunk_count
        ));
        out.push_str(&format!("   Preview: {}\n", doc.preview));
        out.push_str(&format!("   Relevance: {:.3}\n\n", doc.max_similarity));
    }
    out
}

/// Metadata lookup for one document, with an optional clipped content
/// preview.
pub struct GetDocumentTool {
    catalog: Arc<dyn DocumentCatalog>,
}

impl GetDocumentTool {
    pub const NAME: &'static str = "get_document_by_id";

    pub fn new(catalog: Arc<dyn DocumentCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for GetDocumentTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Get document metadata by ID, optionally with a truncated \
                          content preview. Use IDs returned by search_documents."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "document_id": {
                        "type": "string",
                        "description": "The unique ID of the document"
                    },
                    "include_content": {
                        "type": "boolean",
                        "description": "Include a content preview of up to 2000 characters"
                    }
                },
                "required": ["document_id"]
            }),
        }
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let document_id = require_str(arguments, "document_id")?;
        let include_content = optional_bool(arguments, "include_content")?.unwrap_or(false);

        let Some(document) = self.catalog.fetch(document_id).await? else {
            return Ok(ToolOutput::Text(format!(
                "Document with ID {document_id} not found"
            )));
        };

        let mut out = String::from("Document Information\n\n");
        out.push_str(&format!("Filename: {}\n", document.filename));
        out.push_str(&format!("ID: {}\n", document.id));
        out.push_str(&format!("Content Type: {}\n", document.content_type));
        out.push_str(&format!("Status: {}\n", document.status));
        out.push_str(&format!(
            "Content Length: {} characters\n",
            document.content_len()
        ));
        out.push_str(&format!("Created At: {}\n", document.created_at.to_rfc3339()));

        match (include_content, document.content.as_deref()) {
            (true, Some(content)) if !content.is_empty() => {
                out.push_str("\nContent Preview:\n");
                out.push_str(&clip_chars(content, CONTENT_PREVIEW_CHARS));
                out.push_str(
                    "\n\nNote: preview is truncated to 2000 characters. \
                     Use read_document_content for the complete text.",
                );
            }
            _ => {
                out.push_str("\nUse read_document_content to retrieve the complete text.");
            }
        }

        Ok(ToolOutput::Text(out))
    }
}

/// Paginated full-content reads, for documents too large for one tool
/// response.
pub struct ReadDocumentContentTool {
    catalog: Arc<dyn DocumentCatalog>,
}

impl ReadDocumentContentTool {
    pub const NAME: &'static str = "read_document_content";

    pub fn new(catalog: Arc<dyn DocumentCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for ReadDocumentContentTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Read complete document content in fixed-size pages. Use for \
                          full-text analysis when the search preview is not enough."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "document_id": {
                        "type": "string",
                        "description": "The unique ID of the document"
                    },
                    "page_size": {
                        "type": "integer",
                        "description": "Characters per page (default 3000)"
                    },
                    "page": {
                        "type": "integer",
                        "description": "Zero-based page to read (default 0)"
                    }
                },
                "required": ["document_id"]
            }),
        }
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let document_id = require_str(arguments, "document_id")?;
        let page_size = optional_usize(arguments, "page_size")?
            .unwrap_or(DEFAULT_PAGE_CHARS)
            .max(1);
        let page = optional_usize(arguments, "page")?.unwrap_or(0);

        let Some(document) = self.catalog.fetch(document_id).await? else {
            return Ok(ToolOutput::Text(format!(
                "Document with ID {document_id} not found"
            )));
        };
        let Some(content) = document.content.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(ToolOutput::Text(format!(
                "Document '{}' has no content",
                document.filename
            )));
        };

        // Char-based slicing keeps page boundaries off multi-byte
        // sequences.
        let chars: Vec<char> = content.chars().collect();
        let total_pages = chars.len().div_ceil(page_size);
        if page >= total_pages {
            return Ok(ToolOutput::Text(format!(
                "Page {page} is out of range. Document has {total_pages} pages (0-{})",
                total_pages - 1
            )));
        }

        let start = page * page_size;
        let end = (start + page_size).min(chars.len());
        let slice: String = chars[start..end].iter().collect();

        let mut out = format!(
            "Document Content - Page {}/{}\n\n",
            page + 1,
            total_pages
        );
        out.push_str(&format!("Document: {}\n", document.filename));
        out.push_str(&format!("ID: {}\n", document.id));
        out.push_str(&format!(
            "Position: {start}-{end} of {} characters\n\n",
            chars.len()
        ));
        out.push_str("Content:\n");
        out.push_str(&slice);
        out.push('\n');

        if total_pages > 1 {
            out.push_str("\nNavigation:\n");
            if page > 0 {
                out.push_str(&format!("- Previous page: page={}\n", page - 1));
            }
            if page + 1 < total_pages {
                out.push_str(&format!("- Next page: page={}\n", page + 1));
            }
            out.push_str(&format!("- All pages: 0 to {}\n", total_pages - 1));
        }

        Ok(ToolOutput::Text(out))
    }
}

/// Catalog queries: filtering, ordering, counting, and grouping.
pub struct QueryDocumentsTool {
    catalog: Arc<dyn DocumentCatalog>,
}

impl QueryDocumentsTool {
    pub const NAME: &'static str = "query_documents";

    pub fn new(catalog: Arc<dyn DocumentCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for QueryDocumentsTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Query the document catalog with filters, ordering, counting, \
                          and grouping. Use for questions about the collection itself, \
                          like document counts or recently uploaded files."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["pending", "processing", "completed", "failed"],
                        "description": "Filter by processing status"
                    },
                    "content_type": {
                        "type": "string",
                        "description": "Filter by exact content type, e.g. application/pdf"
                    },
                    "filename_contains": {
                        "type": "string",
                        "description": "Filter by filename substring (case-insensitive)"
                    },
                    "created_after": {
                        "type": "string",
                        "description": "ISO date or datetime lower bound"
                    },
                    "created_before": {
                        "type": "string",
                        "description": "ISO date or datetime upper bound"
                    },
                    "min_content_length": {
                        "type": "integer",
                        "description": "Minimum content length in characters"
                    },
                    "max_content_length": {
                        "type": "integer",
                        "description": "Maximum content length in characters"
                    },
                    "order_by": {
                        "type": "string",
                        "enum": ["created_at", "filename", "content_length", "status"],
                        "description": "Sort field"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of documents to return"
                    },
                    "count_only": {
                        "type": "boolean",
                        "description": "Return only the matching count"
                    },
                    "group_by": {
                        "type": "string",
                        "enum": ["status", "content_type", "extension"],
                        "description": "Group results and report per-group counts"
                    }
                }
            }),
        }
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let query = build_catalog_query(arguments)?;
        let documents = self.catalog.query(&query).await?;

        if optional_bool(arguments, "count_only")?.unwrap_or(false) {
            return Ok(ToolOutput::Text(format!(
                "Total matching documents: {}",
                documents.len()
            )));
        }

        if let Some(group_by) = optional_str(arguments, "group_by")? {
            return Ok(ToolOutput::Text(render_grouped(&documents, group_by)?));
        }

        if documents.is_empty() {
            return Ok(ToolOutput::Text("No documents found".to_string()));
        }

        let mut out = format!("Found {} documents\n\n", documents.len());
        for (i, doc) in documents.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, doc.filename));
            out.push_str(&format!("   ID: {}\n", doc.id));
            out.push_str(&format!("   Status: {}\n", doc.status));
            out.push_str(&format!("   Type: {}\n", doc.content_type));
            out.push_str(&format!("   Size: {} characters\n", doc.content_len()));
            out.push_str(&format!(
                "   Created: {}\n\n",
                doc.created_at.to_rfc3339()
            ));
        }
        Ok(ToolOutput::Text(out))
    }
}

fn build_catalog_query(
    arguments: &Map<String, Value>,
) -> Result<crate::gateways::DocumentQuery, ToolError> {
    let status = match optional_str(arguments, "status")? {
        Some(raw) => Some(
            DocumentStatus::parse(raw).ok_or_else(|| ToolError::InvalidArgument {
                name: "status",
                reason: format!("unknown status `{raw}`"),
            })?,
        ),
        None => None,
    };
    let order_by = match optional_str(arguments, "order_by")? {
        Some(raw) => Some(
            DocumentOrder::parse(raw).ok_or_else(|| ToolError::InvalidArgument {
                name: "order_by",
                reason: format!("unknown sort field `{raw}`"),
            })?,
        ),
        None => None,
    };

    Ok(crate::gateways::DocumentQuery {
        status,
        content_type: optional_str(arguments, "content_type")?.map(str::to_string),
        filename_contains: optional_str(arguments, "filename_contains")?.map(str::to_string),
        created_after: parse_bound(arguments, "created_after")?,
        created_before: parse_bound(arguments, "created_before")?,
        min_content_length: optional_usize(arguments, "min_content_length")?,
        max_content_length: optional_usize(arguments, "max_content_length")?,
        order_by,
        limit: optional_usize(arguments, "limit")?,
    })
}

/// Accepts either an RFC 3339 datetime or a plain date, which is read as
/// midnight UTC.
fn parse_bound(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<DateTime<Utc>>, ToolError> {
    let Some(raw) = optional_str(arguments, name)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ToolError::InvalidArgument {
                name,
                reason: format!("cannot interpret date `{raw}`"),
            })?;
        return Ok(Some(midnight.and_utc()));
    }
    Err(ToolError::InvalidArgument {
        name,
        reason: format!("cannot parse `{raw}` as an ISO date or datetime"),
    })
}

fn render_grouped(documents: &[DocumentRecord], group_by: &str) -> Result<String, ToolError> {
    let key_of = |doc: &DocumentRecord| -> String {
        match group_by {
            "status" => doc.status.to_string(),
            "content_type" => doc.content_type.clone(),
            "extension" => doc
                .filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_else(|| "unknown".to_string()),
            _ => String::new(),
        }
    };
    if !matches!(group_by, "status" | "content_type" | "extension") {
        return Err(ToolError::InvalidArgument {
            name: "group_by",
            reason: format!("unknown grouping field `{group_by}`"),
        });
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: FxHashMap<String, Vec<&DocumentRecord>> = FxHashMap::default();
    for doc in documents {
        let key = key_of(doc);
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(doc);
    }

    let mut out = format!("Documents grouped by {group_by}\n\n");
    for key in order {
        let group = &groups[&key];
        out.push_str(&format!("{key}: {} documents\n", group.len()));
        for doc in group.iter().take(3) {
            out.push_str(&format!("  - {} ({})\n", doc.filename, doc.status));
        }
        if group.len() > 3 {
            out.push_str(&format!("  ... and {} more\n", group.len() - 3));
        }
        out.push('\n');
    }
    Ok(out)
}
