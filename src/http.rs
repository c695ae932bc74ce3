//! HTTP transport for the MCP endpoint
//!
//! One-shot request/response framing of the same JSON-RPC envelope the stdio
//! loop speaks: each `POST /mcp` carries exactly one protocol message.

use crate::error::{Error, Result};
use crate::mcp::{ErrorCode, McpServer, RpcError, RpcMessage, RpcResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{any, get},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the router; separate from `serve` so tests can drive it directly
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", any(mcp_handler))
        .route("/health", get(health_handler))
        .fallback(fallback_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(server)
}

/// Bind and serve until Ctrl-C or SIGTERM
pub async fn serve(server: McpServer, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid bind address: {}", e)))?;

    let app = router(Arc::new(server));

    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "MCP endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// GET /health - liveness probe
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn fallback_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// ANY /mcp - the protocol endpoint.
///
/// Only POST carries messages; OPTIONS is answered for CORS preflight and
/// every other method gets a protocol-level fault envelope. An unparseable
/// body is answered with a parse-error envelope (null id) and HTTP 500.
async fn mcp_handler(
    State(server): State<Arc<McpServer>>,
    method: Method,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        // CORS headers come from the permissive layer
        return StatusCode::NO_CONTENT.into_response();
    }

    if method != Method::POST {
        let response = RpcResponse::error(
            None,
            RpcError::new(
                ErrorCode::InvalidRequest,
                format!("Method not allowed: {}", method),
            ),
        );
        return (StatusCode::METHOD_NOT_ALLOWED, Json(response)).into_response();
    }

    let message: RpcMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            let response = RpcResponse::error(
                None,
                RpcError::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response();
        }
    };

    match message {
        RpcMessage::Request(request) => Json(server.handle_request(request).await).into_response(),
        RpcMessage::Notification(notification) => {
            server.handle_notification(notification).await;
            StatusCode::ACCEPTED.into_response()
        }
        RpcMessage::Response(_) => {
            warn!("Unexpected response message received");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::openai::OpenAiClient;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let mut config = Config::default();
        config.openai.base_url = "http://127.0.0.1:9".to_string();
        let client = OpenAiClient::with_credentials(
            &config.openai.base_url,
            "sk-test".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        router(Arc::new(McpServer::new(config, client)))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap_or(json!({}))
    }

    #[tokio::test]
    async fn test_post_initialize_round_trips() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "jsonrpc": "2.0", "id": 7, "method": "initialize" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    }

    #[tokio::test]
    async fn test_unparseable_body_is_500_with_parse_error_envelope() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_non_post_method_gets_fault_envelope() {
        let app = test_router();

        let request = Request::builder()
            .method("GET")
            .uri("/mcp")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], -32600);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Method not allowed"));
    }

    #[tokio::test]
    async fn test_notification_is_accepted_without_body() {
        let app = test_router();

        let request = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let app = test_router();

        let request = Request::builder()
            .method("GET")
            .uri("/sse")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_router();

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_options_answered_with_cors_headers() {
        let app = test_router();

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/mcp")
            .header("origin", "https://example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_success() || response.status() == StatusCode::NO_CONTENT);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
