//! Request and response types for the upstream API.
//!
//! The completion endpoint's reply shape varies across API revisions, so the
//! response types keep every field optional and text extraction runs through
//! an ordered chain of extractors instead of trusting any single shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback returned when no extractor finds usable text.
pub const NO_CONTENT_FALLBACK: &str = "No response content received from OpenAI API";

// === Completion request ===

/// Content fragment inside a request input item
#[derive(Debug, Clone, Serialize)]
pub struct InputContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// One role-tagged message in the request input sequence
#[derive(Debug, Clone, Serialize)]
pub struct InputItem {
    pub role: String,
    pub content: Vec<InputContent>,
}

impl InputItem {
    /// Build a plain-text input item for the given role
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: vec![InputContent {
                kind: "input_text".to_string(),
                text: text.into(),
            }],
        }
    }
}

/// The file-search augmentation tool, bound to specific vector stores
#[derive(Debug, Clone, Serialize)]
pub struct FileSearchTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub vector_store_ids: Vec<String>,
}

impl FileSearchTool {
    pub fn for_store(vector_store_id: impl Into<String>) -> Self {
        Self {
            kind: "file_search".to_string(),
            vector_store_ids: vec![vector_store_id.into()],
        }
    }
}

/// Forced tool selection; the model cannot opt out of searching
#[derive(Debug, Clone, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request body for the completion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: Vec<InputItem>,
    pub tools: Vec<FileSearchTool>,
    pub tool_choice: ToolChoice,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

// === Completion response ===

/// Completion endpoint reply; all fields optional by design
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponsesReply {
    /// Flat convenience text, present in some API revisions
    #[serde(default)]
    pub output_text: Option<String>,

    /// Ordered output items, each holding tagged content fragments
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputItem {
    #[serde(default)]
    pub content: Vec<OutputContent>,
}

/// Output fragment tagged by kind; only `output_text` fragments carry
/// finalized text, everything else (annotations, refusals, tool traces)
/// is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

type Extractor = fn(&ResponsesReply) -> Option<String>;

fn convenience_text(reply: &ResponsesReply) -> Option<String> {
    reply
        .output_text
        .as_ref()
        .filter(|text| !text.is_empty())
        .cloned()
}

fn first_output_item_text(reply: &ResponsesReply) -> Option<String> {
    let item = reply.output.first()?;
    let text: String = item
        .content
        .iter()
        .filter(|fragment| fragment.kind == "output_text")
        .filter_map(|fragment| fragment.text.as_deref())
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Extractors in probe order; first match wins.
const EXTRACTORS: &[Extractor] = &[convenience_text, first_output_item_text];

/// Pull the answer text out of a completion reply.
///
/// Never fails: a reply matching no known shape degrades to
/// [`NO_CONTENT_FALLBACK`].
pub fn extract_output_text(reply: &ResponsesReply) -> String {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(reply))
        .unwrap_or_else(|| NO_CONTENT_FALLBACK.to_string())
}

// === Vector store search ===

/// Search query: a single string or an ordered list, forwarded verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
    One(String),
    Many(Vec<String>),
}

impl QueryInput {
    /// Human-readable echo for report headers
    pub fn display(&self) -> String {
        match self {
            QueryInput::One(query) => query.clone(),
            QueryInput::Many(queries) => queries.join(", "),
        }
    }
}

/// Ranking options passed through to the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOptions {
    pub ranker: String,
}

/// Request body for the vector store search endpoint
#[derive(Debug, Clone, Serialize)]
pub struct VectorSearchRequest {
    pub query: QueryInput,
    pub max_num_results: u32,
    pub score_threshold: f64,
    pub rewrite_query: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ranking_options: Option<RankingOptions>,
}

/// Search endpoint reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VectorSearchReply {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub search_query: Option<Value>,
    #[serde(default)]
    pub data: Vec<SearchHit>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// One scored hit from the vector store
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub file_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub attributes: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub content: Vec<HitContent>,
}

/// Content fragment of a hit, tagged by kind
#[derive(Debug, Clone, Deserialize)]
pub struct HitContent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}
