//! MCP server: JSON-RPC dispatch and the stdio transport
//!
//! `McpServer` owns the configuration and the upstream client; both
//! transports (the stdio loop here, the HTTP endpoint in `crate::http`)
//! funnel into `handle_request`.

use super::tools::{get_tool_definitions, handle_tool_call};
use super::types::{
    CallToolParams, ErrorCode, RpcError, RpcMessage, RpcNotification, RpcRequest, RpcResponse,
};
use crate::config::Config;
use crate::error::Result;
use crate::openai::OpenAiClient;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

/// MCP server implementation
pub struct McpServer {
    config: Config,
    client: OpenAiClient,
}

impl McpServer {
    /// Create a new MCP server; the upstream client is injected so tests can
    /// point it at a fake API.
    pub fn new(config: Config, client: OpenAiClient) -> Self {
        Self { config, client }
    }

    /// Run the MCP server loop over stdio
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        info!("MCP server starting on stdio");

        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read line: {}", e);
                    continue;
                }
            };

            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            let message: RpcMessage = match serde_json::from_str(&line) {
                Ok(message) => message,
                Err(e) => {
                    error!("Failed to parse message: {}", e);
                    let response = RpcResponse::error(
                        None,
                        RpcError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
                    );
                    writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
                    stdout.flush()?;
                    continue;
                }
            };

            match message {
                RpcMessage::Request(request) => {
                    let response = self.handle_request(request).await;
                    let response_str = serde_json::to_string(&response)?;
                    debug!("Sending: {}", response_str);
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                RpcMessage::Notification(notification) => {
                    self.handle_notification(notification).await;
                }
                RpcMessage::Response(_) => {
                    warn!("Unexpected response message received");
                }
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle an MCP request
    pub async fn handle_request(&self, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, request.params).await,
            "resources/list" => RpcResponse::success(id, json!({ "resources": [] })),
            "prompts/list" => RpcResponse::success(id, json!({ "prompts": [] })),
            _ => RpcResponse::error(
                id,
                RpcError::new(
                    ErrorCode::MethodNotFound,
                    format!("Method not found: {}", request.method),
                ),
            ),
        }
    }

    /// Handle notifications (fire-and-forget)
    pub async fn handle_notification(&self, notification: RpcNotification) {
        match notification.method.as_str() {
            "notifications/initialized" => {
                info!("Client initialized");
            }
            "notifications/cancelled" => {
                info!("Request cancelled");
            }
            _ => {
                debug!("Unknown notification: {}", notification.method);
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> RpcResponse {
        RpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    },
                    "resources": {
                        "subscribe": false,
                        "listChanged": false
                    },
                    "prompts": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": "refdesk",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> RpcResponse {
        let tools = get_tool_definitions();
        RpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> RpcResponse {
        let params = match params {
            Some(params) => params,
            None => {
                return RpcResponse::error(
                    id,
                    RpcError::new(ErrorCode::InvalidParams, "Missing params"),
                )
            }
        };

        let call: CallToolParams = match serde_json::from_value(params) {
            Ok(call) => call,
            Err(e) => {
                return RpcResponse::error(
                    id,
                    RpcError::new(ErrorCode::InvalidParams, format!("Invalid params: {}", e)),
                )
            }
        };

        debug!("Calling tool: {} with args: {:?}", call.name, call.arguments);

        let result = handle_tool_call(&call.name, &call.arguments, &self.config, &self.client).await;

        RpcResponse::success(
            id,
            json!({
                "content": result.content,
                "isError": result.is_error
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_server() -> McpServer {
        let mut config = Config::default();
        config.openai.base_url = "http://127.0.0.1:9".to_string();
        let client = OpenAiClient::with_credentials(
            &config.openai.base_url,
            "sk-test".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        McpServer::new(config, client)
    }

    fn request(method: &str, params: Option<Value>) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize_reports_protocol_and_server() {
        let server = test_server();
        let response = server.handle_request(request("initialize", None)).await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "refdesk");
    }

    #[tokio::test]
    async fn test_tools_list_exposes_both_tools() {
        let server = test_server();
        let response = server.handle_request(request("tools/list", None)).await;

        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "file_search_assistant");
        assert_eq!(tools[1]["name"], "vector_store_search");
        assert!(tools[1]["inputSchema"]["properties"]["query"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_method_is_method_not_found() {
        let server = test_server();
        let response = server.handle_request(request("documents/list", None)).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::MethodNotFound as i32);
    }

    #[tokio::test]
    async fn test_tools_call_without_params_is_invalid_params() {
        let server = test_server();
        let response = server.handle_request(request("tools/call", None)).await;

        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::InvalidParams as i32);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool_is_tool_level_error() {
        let server = test_server();
        let response = server
            .handle_request(request(
                "tools/call",
                Some(json!({ "name": "nope", "arguments": {} })),
            ))
            .await;

        // Unknown tools are a tool-result error, not a protocol fault
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_request_id_round_trips() {
        let server = test_server();
        let mut req = request("tools/list", None);
        req.id = Some(json!("abc-42"));

        let response = server.handle_request(req).await;
        assert_eq!(response.id, Some(json!("abc-42")));
    }
}
