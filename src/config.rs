//! Configuration for the orchestrator and the retrieval engine.
//!
//! Defaults mirror the documented guard rails (iteration cap 5, 8 000-char
//! tool output truncation, 500-chunk / 10 000-char stream caps). Environment
//! overrides are resolved once at construction via `dotenvy`, never at call
//! sites.

use std::time::Duration;

/// Guard rails and model options for one orchestrator instance.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Model identifier passed through to the language model gateway.
    pub model: String,
    /// Hard cap on think/act rounds per user turn.
    pub max_iterations: u32,
    /// Timeout for each single-shot language model call.
    pub llm_timeout: Duration,
    /// Timeout for initiating a streaming language model call.
    pub stream_init_timeout: Duration,
    /// Tool outputs longer than this are truncated (with a visible marker)
    /// before being inserted into history.
    pub max_tool_output_chars: usize,
    /// Cap on deltas consumed from one model stream.
    pub max_stream_chunks: u32,
    /// Cap on accumulated streamed characters per round.
    pub max_stream_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Model used for background chat-title generation.
    pub title_model: String,
    /// Generated titles are clipped to this many characters.
    pub title_max_len: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let model = resolve_model(None);
        Self {
            title_model: model.clone(),
            model,
            max_iterations: 5,
            llm_timeout: Duration::from_secs(60),
            stream_init_timeout: Duration::from_secs(5),
            max_tool_output_chars: 8_000,
            max_stream_chunks: 500,
            max_stream_chars: 10_000,
            temperature: 0.0,
            max_tokens: 4_000,
            title_max_len: 60,
        }
    }
}

fn resolve_model(provided: Option<String>) -> String {
    if let Some(model) = provided {
        return model;
    }
    dotenvy::dotenv().ok();
    std::env::var("DOCENT_MODEL").unwrap_or_else(|_| "gpt-oss:20b".to_string())
}

impl AgentConfig {
    pub fn new(model: Option<String>) -> Self {
        let model = resolve_model(model);
        Self {
            title_model: model.clone(),
            model,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_stream_init_timeout(mut self, timeout: Duration) -> Self {
        self.stream_init_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_max_tool_output_chars(mut self, max: usize) -> Self {
        self.max_tool_output_chars = max;
        self
    }

    #[must_use]
    pub fn with_stream_caps(mut self, max_chunks: u32, max_chars: usize) -> Self {
        self.max_stream_chunks = max_chunks;
        self.max_stream_chars = max_chars;
        self
    }

    #[must_use]
    pub fn with_title_model(mut self, model: impl Into<String>) -> Self {
        self.title_model = model.into();
        self
    }
}

/// Tuning knobs for the hybrid retrieval & ranking engine.
#[derive(Clone, Debug)]
pub struct RetrievalConfig {
    /// Raw chunk hits fetched per requested document (grouping collapses
    /// many chunk hits into fewer documents, so the gateway is over-queried).
    pub overfetch_factor: usize,
    /// Chunks with similarity above this floor are retained even with zero
    /// lexical overlap (pure-paraphrase matches).
    pub high_similarity_floor: f32,
    /// Relevance score assigned to chunks kept only by the similarity floor.
    pub semantic_only_relevance: f32,
    /// Query words must be strictly longer than this to count.
    pub min_word_len: usize,
    /// Number of top-relevance chunks merged into a document's excerpt.
    pub preview_chunks: usize,
    /// Maximum preview length in characters.
    pub preview_max_len: usize,
    /// Characters of lead-in kept before the earliest query-word match.
    pub preview_lead_in: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            overfetch_factor: 3,
            high_similarity_floor: 0.8,
            semantic_only_relevance: 0.1,
            min_word_len: 2,
            preview_chunks: 3,
            preview_max_len: 300,
            preview_lead_in: 50,
        }
    }
}

impl RetrievalConfig {
    #[must_use]
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.overfetch_factor = factor.max(1);
        self
    }

    #[must_use]
    pub fn with_preview_max_len(mut self, max_len: usize) -> Self {
        self.preview_max_len = max_len;
        self
    }

    #[must_use]
    pub fn with_high_similarity_floor(mut self, floor: f32) -> Self {
        self.high_similarity_floor = floor;
        self
    }
}
