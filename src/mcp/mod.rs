//! MCP (Model Context Protocol) server implementation
//!
//! Exposes the two upstream adapters as MCP tools, reachable over stdio
//! (`refdesk mcp`) or HTTP (`refdesk serve`).

mod server;
mod tools;
mod types;

pub use server::McpServer;
pub use tools::{get_tool_definitions, handle_tool_call, ToolDefinition};
pub use types::{
    CallToolParams, ErrorCode, RpcError, RpcMessage, RpcNotification, RpcRequest, RpcResponse,
    ToolContent, ToolResult,
};
