//! # refdesk
//!
//! A small MCP adapter over the OpenAI API, exposing two tools:
//! - `file_search_assistant`: detailed answers grounded in a fixed vector
//!   store (completion endpoint with a forced file-search tool)
//! - `vector_store_search`: direct vector store search rendered as a
//!   readable report
//!
//! The heavy lifting (retrieval, ranking, generation) happens upstream; this
//! crate shapes requests and responses between the MCP envelope and the API,
//! and serves the tools over stdio or a one-shot HTTP endpoint.

pub mod config;
pub mod error;
pub mod http;
pub mod mcp;
pub mod openai;
