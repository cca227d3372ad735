//! Rule search over the rules vector collection.
//!
//! Unlike document search there is no grouping pass: each hit is one rule
//! fragment and the report is built straight from the hit payloads.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::gateways::{
    ChunkHit, EmbeddingGateway, EmbeddingRole, SearchFilter, ToolSpec, VectorSearchGateway,
};

use super::{Tool, ToolError, ToolOutput, optional_str_list, optional_usize, require_str};

const DEFAULT_LIMIT: usize = 10;
const SIMILARITY_THRESHOLD: f32 = 0.7;

pub struct SearchRulesTool {
    embedding: Arc<dyn EmbeddingGateway>,
    rules: Arc<dyn VectorSearchGateway>,
}

impl SearchRulesTool {
    pub const NAME: &'static str = "search_rules";

    /// `rules` must be a gateway over the rules collection, where the
    /// filter's document IDs select rule IDs and its document types select
    /// category IDs.
    pub fn new(embedding: Arc<dyn EmbeddingGateway>, rules: Arc<dyn VectorSearchGateway>) -> Self {
        Self { embedding, rules }
    }
}

#[async_trait]
impl Tool for SearchRulesTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.to_string(),
            description: "Search business rules with semantic vector search, optionally \
                          restricted to specific rules or categories."
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
                        "description": "Maximum number of rules to return (default 10)"
                    },
                    "rule_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Restrict the search to these rule IDs"
                    },
                    "category_ids": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Restrict the search to these category IDs"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError> {
        let query = require_str(arguments, "query")?;
        let limit = optional_usize(arguments, "limit")?
            .unwrap_or(DEFAULT_LIMIT)
            .max(1);
        let rule_ids = optional_str_list(arguments, "rule_ids")?;
        let category_ids = optional_str_list(arguments, "category_ids")?;

        let vectors = self
            .embedding
            .embed(&[query.to_string()], EmbeddingRole::Query)
            .await?;
        let Some(query_vector) = vectors.into_iter().next() else {
            return Ok(ToolOutput::Text(format!(
                "No rules found matching query: '{query}'"
            )));
        };

        let filter = SearchFilter {
            document_ids: rule_ids.clone().filter(|ids| !ids.is_empty()),
            document_types: category_ids.clone().filter(|ids| !ids.is_empty()),
        };
        let filter = (!filter.is_empty()).then_some(filter);

        let mut hits = self
            .rules
            .search(&query_vector, limit, SIMILARITY_THRESHOLD, filter.as_ref())
            .await?;
        debug!(query = %query, hits = hits.len(), "search_rules completed");

        if hits.is_empty() {
            return Ok(ToolOutput::Text(format!(
                "No rules found matching query: '{query}'"
            )));
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });

        Ok(ToolOutput::Text(render_rules_report(
            query,
            &hits,
            rule_ids.as_deref(),
            category_ids.as_deref(),
        )))
    }
}

fn render_rules_report(
    query: &str,
    hits: &[ChunkHit],
    rule_ids: Option<&[String]>,
    category_ids: Option<&[String]>,
) -> String {
    let mut out = match (rule_ids, category_ids) {
        (Some(ids), _) if !ids.is_empty() => format!(
            "Found {} rules matching '{query}' (search limited to {} specified rules):\n\n",
            hits.len(),
            ids.len()
        ),
        (_, Some(ids)) if !ids.is_empty() => format!(
            "Found {} rules matching '{query}' in specified categories:\n\n",
            hits.len()
        ),
        _ => format!("Found {} rules matching '{query}':\n\n", hits.len()),
    };

    for (i, hit) in hits.iter().enumerate() {
        let title = hit.meta_str("rule_title").unwrap_or("Untitled rule");
        let rule_id = hit.meta_str("rule_id").unwrap_or(&hit.document_id);
        let category_title = hit.meta_str("category_title").unwrap_or("Uncategorized");
        let category_id = hit.meta_str("category_id").unwrap_or("-");
        out.push_str(&format!("{}. {title}\n", i + 1));
        out.push_str(&format!("   Rule ID: {rule_id}\n"));
        out.push_str(&format!("   Category: {category_title} (ID: {category_id})\n"));
        out.push_str(&format!("   Relevance: {:.3}\n", hit.similarity));
        out.push_str(&format!("   Content: {}\n\n", hit.content));
    }
    out
}
