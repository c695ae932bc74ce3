//! MCP tool definitions and handlers
//!
//! The two tools are stateless adapters over the upstream API: one asks the
//! completion endpoint for a detailed answer grounded in the configured
//! vector store, the other searches that store directly and renders a
//! readable report.

use super::types::ToolResult;
use crate::config::Config;
use crate::error::Error;
use crate::openai::{
    extract_output_text, FileSearchTool, InputItem, OpenAiClient, QueryInput, RankingOptions,
    ResponsesRequest, SearchHit, ToolChoice, VectorSearchReply, VectorSearchRequest,
};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Instructions sent with every answer-generation request. The model is told
/// to produce raw material for a downstream summarizer, not a summary.
const ANSWER_INSTRUCTIONS: &str = r#"Generate a detailed, rich, and information-dense response to any given query or topic, focusing on providing as much original and granular detail as possible. Your objective is to output content that maximizes raw material, background, evidence, and specific facts, rather than summarizing, paraphrasing, or condensing. The user will use your output as input for another AI system to summarize, so prioritize maximal breadth and depth in your content.

Output format:

- Structure your answer in an organized list or multi-paragraph format (not in code blocks).
- Each relevant idea, fact, or subpoint should be developed as fully as possible, with concrete examples, context, and factual evidence wherever possible.
- Avoid summarizing, generalizing, or drawing conclusions—provide primary details and raw material only.
- Do not use bullet points or numbered lists if the topic requires narrative expansion; use paragraphs as appropriate to maximize raw content volume.
- Do not include any meta-comments, "as an AI language model," or restate user instructions.

If the topic is particularly broad, ensure coverage of all relevant subtopics, and expand each section with different aspects, data, and anecdotes. For narrowly focused requests, maximize the level of detail and cite specific facts or event timelines.

Your primary goal is to generate as much original, factual, and detailed content as possible, without summarizing."#;

/// Text fragments in the search report are cut off beyond this many characters
const FRAGMENT_PREVIEW_CHARS: usize = 500;

/// Tool definition for MCP
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "file_search_assistant".to_string(),
            description: "Generate a detailed, information-dense answer for one or more queries, grounded in the configured vector store.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "queries": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Array of queries or topics to generate detailed responses for"
                    }
                },
                "required": ["queries"]
            }),
        },
        ToolDefinition {
            name: "vector_store_search".to_string(),
            description: "Search the configured vector store and return scored chunks with their attributes.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "description": "Search query: a single string or a list of strings",
                        "anyOf": [
                            { "type": "string" },
                            { "type": "array", "items": { "type": "string" } }
                        ]
                    },
                    "vector_store_id": {
                        "type": "string",
                        "description": "Override the configured vector store"
                    },
                    "filters": {
                        "type": "object",
                        "description": "Attribute filter object, passed through to the search API"
                    },
                    "max_num_results": {
                        "type": "integer",
                        "description": "Maximum number of results to return",
                        "default": 10,
                        "minimum": 1,
                        "maximum": 50
                    },
                    "ranking_options": {
                        "type": "object",
                        "properties": {
                            "ranker": { "type": "string", "enum": ["auto", "none"] }
                        }
                    },
                    "score_threshold": {
                        "type": "number",
                        "description": "Drop results scoring below this value",
                        "default": 0,
                        "minimum": 0,
                        "maximum": 1
                    },
                    "rewrite_query": {
                        "type": "boolean",
                        "description": "Let the API rewrite the query for better recall",
                        "default": false
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Handle a tool call
pub async fn handle_tool_call(
    name: &str,
    arguments: &HashMap<String, Value>,
    config: &Config,
    client: &OpenAiClient,
) -> ToolResult {
    match name {
        "file_search_assistant" => handle_answer(arguments, config, client).await,
        "vector_store_search" => handle_vector_search(arguments, config, client).await,
        _ => ToolResult::error(format!("Unknown tool: {}", name)),
    }
}

/// Handle file_search_assistant tool
async fn handle_answer(
    arguments: &HashMap<String, Value>,
    config: &Config,
    client: &OpenAiClient,
) -> ToolResult {
    let queries = match arguments.get("queries") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect::<Vec<_>>(),
        _ => return ToolResult::error("Missing required parameter: queries"),
    };

    // An empty list is valid and yields an empty combined prompt
    let request = answer_request(config, combined_prompt(&queries));

    match client.create_response(&request).await {
        Ok(reply) => ToolResult::text(extract_output_text(&reply)),
        Err(e) => ToolResult::error(format!("Error calling OpenAI API: {}", e)),
    }
}

/// Join queries into one user message, preserving order
fn combined_prompt(queries: &[String]) -> String {
    queries.join("\n\n")
}

fn answer_request(config: &Config, prompt: String) -> ResponsesRequest {
    ResponsesRequest {
        model: config.openai.model.clone(),
        input: vec![
            InputItem::text("system", ANSWER_INSTRUCTIONS),
            InputItem::text("user", prompt),
        ],
        tools: vec![FileSearchTool::for_store(&config.openai.vector_store_id)],
        tool_choice: ToolChoice {
            kind: "file_search".to_string(),
        },
        temperature: config.openai.temperature,
        max_output_tokens: config.openai.max_output_tokens,
    }
}

/// Handle vector_store_search tool
async fn handle_vector_search(
    arguments: &HashMap<String, Value>,
    config: &Config,
    client: &OpenAiClient,
) -> ToolResult {
    let query = match arguments.get("query") {
        Some(Value::String(query)) => QueryInput::One(query.clone()),
        Some(Value::Array(items)) => QueryInput::Many(
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect(),
        ),
        _ => return ToolResult::error("Missing required parameter: query"),
    };

    // Bounds are enforced here, before anything touches the network
    let max_num_results = arguments
        .get("max_num_results")
        .and_then(|value| value.as_i64())
        .unwrap_or(10);
    if !(1..=50).contains(&max_num_results) {
        return ToolResult::error("max_num_results must be between 1 and 50");
    }

    let score_threshold = arguments
        .get("score_threshold")
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    if !(0.0..=1.0).contains(&score_threshold) {
        return ToolResult::error("score_threshold must be between 0 and 1");
    }

    let ranking_options = match arguments.get("ranking_options") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<RankingOptions>(value.clone()) {
            Ok(options) if options.ranker == "auto" || options.ranker == "none" => Some(options),
            _ => {
                return ToolResult::error("ranking_options.ranker must be \"auto\" or \"none\"")
            }
        },
    };

    let rewrite_query = arguments
        .get("rewrite_query")
        .and_then(|value| value.as_bool())
        .unwrap_or(false);

    let filters = match arguments.get("filters") {
        None | Some(Value::Null) => None,
        Some(value) if value.is_object() => Some(value.clone()),
        Some(_) => return ToolResult::error("filters must be an object"),
    };

    let vector_store_id = arguments
        .get("vector_store_id")
        .and_then(|value| value.as_str())
        .unwrap_or(&config.openai.vector_store_id)
        .to_string();

    let request = VectorSearchRequest {
        query: query.clone(),
        max_num_results: max_num_results as u32,
        score_threshold,
        rewrite_query,
        filters,
        ranking_options,
    };

    match client.vector_store_search(&vector_store_id, &request).await {
        Ok((reply, raw)) => ToolResult::text(format_search_report(&query, &reply, &raw)),
        // Upstream status faults are echoed verbatim: "<status> <status text>\n<body>"
        Err(e @ Error::UpstreamStatus { .. }) => ToolResult::error(e.to_string()),
        Err(e) => ToolResult::error(format!("Error searching vector store: {}", e)),
    }
}

/// Render the hit list as a Markdown report, raw JSON appended for debugging
fn format_search_report(query: &QueryInput, reply: &VectorSearchReply, raw: &Value) -> String {
    let mut output = String::new();

    output.push_str("# Vector Store Search Results\n\n");
    output.push_str(&format!("**Query:** {}\n", query.display()));
    output.push_str(&format!("**Results:** {}\n", reply.data.len()));
    output.push_str(&format!(
        "**Has more:** {}\n\n",
        if reply.has_more { "yes" } else { "no" }
    ));

    for hit in &reply.data {
        format_hit(&mut output, hit);
    }

    output.push_str("<details>\n<summary>Raw response</summary>\n\n```json\n");
    output.push_str(&serde_json::to_string_pretty(raw).unwrap_or_else(|_| "{}".to_string()));
    output.push_str("\n```\n</details>\n");

    output
}

fn format_hit(output: &mut String, hit: &SearchHit) {
    let title = hit.filename.as_deref().unwrap_or(&hit.file_id);
    output.push_str(&format!("## {}\n", title));
    output.push_str(&format!("- **File ID:** {}\n", hit.file_id));

    let score = hit
        .score
        .map(|score| format!("{:.4}", score))
        .unwrap_or_else(|| "N/A".to_string());
    output.push_str(&format!("- **Score:** {}\n", score));

    if let Some(first) = hit.content.first() {
        output.push_str(&format!("- **Content type:** {}\n", first.kind));
    }

    if let Some(attributes) = &hit.attributes {
        for (key, value) in attributes {
            output.push_str(&format!("- **{}:** {}\n", key, attribute_value(value)));
        }
    }

    for fragment in &hit.content {
        if fragment.kind == "text" {
            if let Some(text) = &fragment.text {
                output.push_str(&format!("\n{}\n", truncate_fragment(text)));
            }
        }
    }

    output.push('\n');
}

/// Strings render bare; everything else as compact JSON
fn attribute_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Cut a fragment to the preview bound, marking the cut with an ellipsis
fn truncate_fragment(text: &str) -> String {
    if text.chars().count() > FRAGMENT_PREVIEW_CHARS {
        let truncated: String = text.chars().take(FRAGMENT_PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
