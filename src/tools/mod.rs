//! Tools the agent can invoke between model turns.
//!
//! Each tool declares a [`ToolSpec`] for the model and executes against
//! injected gateways. Outputs are tagged: retrieval tools return their
//! ranked documents alongside the rendered report, so the agent loop can
//! lift sources out of them without inspecting strings.

pub mod documents;
pub mod registry;
pub mod rules;

use async_trait::async_trait;
use miette::Diagnostic;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::gateways::{GatewayError, ToolSpec};
use crate::retrieval::{RankedDocument, RetrievalError};

pub use documents::{
    GetDocumentTool, QueryDocumentsTool, ReadDocumentContentTool, SearchDocumentsTool,
};
pub use registry::ToolRegistry;
pub use rules::SearchRulesTool;

/// What a tool produced.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Plain text for the model.
    Text(String),
    /// A retrieval result: the ranked documents plus the text report the
    /// model sees.
    Retrieval {
        documents: Vec<RankedDocument>,
        rendered: String,
    },
}

impl ToolOutput {
    /// The text the model is shown, whichever variant this is.
    pub fn rendered(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Retrieval { rendered, .. } => rendered,
        }
    }

    pub fn into_rendered(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Retrieval { rendered, .. } => rendered,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    #[error("missing required argument `{name}`")]
    #[diagnostic(code(docent::tools::missing_argument))]
    MissingArgument { name: &'static str },

    #[error("invalid argument `{name}`: {reason}")]
    #[diagnostic(code(docent::tools::invalid_argument))]
    InvalidArgument { name: &'static str, reason: String },

    #[error("retrieval failed")]
    #[diagnostic(code(docent::tools::retrieval))]
    Retrieval(#[from] RetrievalError),

    #[error("gateway call failed")]
    #[diagnostic(code(docent::tools::gateway))]
    Gateway(#[from] GatewayError),
}

/// A callable tool with a model-facing schema.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn spec(&self) -> ToolSpec;

    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolError>;
}

pub(crate) fn require_str<'a>(
    arguments: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ToolError> {
    match arguments.get(name) {
        Some(Value::String(value)) => Ok(value),
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected a string, got {other}"),
        }),
        None => Err(ToolError::MissingArgument { name }),
    }
}

pub(crate) fn optional_str<'a>(
    arguments: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a str>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected a string, got {other}"),
        }),
    }
}

pub(crate) fn optional_usize(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<usize>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(value) => Ok(Some(value as usize)),
            None => Err(ToolError::InvalidArgument {
                name,
                reason: format!("expected a non-negative integer, got {number}"),
            }),
        },
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected an integer, got {other}"),
        }),
    }
}

pub(crate) fn optional_f32(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<f32>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => match number.as_f64() {
            Some(value) => Ok(Some(value as f32)),
            None => Err(ToolError::InvalidArgument {
                name,
                reason: format!("expected a number, got {number}"),
            }),
        },
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected a number, got {other}"),
        }),
    }
}

pub(crate) fn optional_bool(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<bool>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(value)) => Ok(Some(*value)),
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

pub(crate) fn optional_str_list(
    arguments: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<Vec<String>>, ToolError> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(value) => out.push(value.clone()),
                    other => {
                        return Err(ToolError::InvalidArgument {
                            name,
                            reason: format!("expected an array of strings, got element {other}"),
                        });
                    }
                }
            }
            Ok(Some(out))
        }
        Some(other) => Err(ToolError::InvalidArgument {
            name,
            reason: format!("expected an array of strings, got {other}"),
        }),
    }
}

/// Truncate on a char boundary, appending an ellipsis when cut.
pub(crate) fn clip_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars).collect();
    clipped.push_str("...");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test args must be an object"),
        }
    }

    #[test]
    fn require_str_rejects_wrong_type() {
        let arguments = args(json!({"query": 7}));
        let err = require_str(&arguments, "query").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument { name: "query", .. }));
    }

    #[test]
    fn optional_helpers_treat_null_as_absent() {
        let arguments = args(json!({"limit": null, "ids": null}));
        assert!(optional_usize(&arguments, "limit").unwrap().is_none());
        assert!(optional_str_list(&arguments, "ids").unwrap().is_none());
    }

    #[test]
    fn str_list_parses_elements() {
        let arguments = args(json!({"ids": ["a", "b"]}));
        let ids = optional_str_list(&arguments, "ids").unwrap().unwrap();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn clip_chars_is_multibyte_safe() {
        let clipped = clip_chars("héllo wörld", 4);
        assert_eq!(clipped, "héll...");
    }
}
