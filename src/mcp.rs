//! Model Context Protocol server over streamable HTTP
//!
//! Clients POST one JSON-RPC 2.0 message per request and get a JSON reply,
//! or `202 Accepted` for notifications. Only the tools capability is offered.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::tools::{ToolError, ToolOutput, Toolset};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "Weather Agent";
pub const SERVER_VERSION: &str = "1.0.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Serves a [`Toolset`] to MCP clients
#[derive(Debug)]
pub struct McpServer {
    name: String,
    version: String,
    tools: Toolset,
}

impl McpServer {
    pub fn new(name: impl Into<String>, version: impl Into<String>, tools: Toolset) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            tools,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &Toolset {
        &self.tools
    }

    /// Answer one JSON-RPC message; notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification");
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {"listChanged": false}},
                    "serverInfo": {"name": self.name, "version": self.version},
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                let tools: Vec<Value> = self
                    .tools
                    .specs()
                    .into_iter()
                    .map(|spec| {
                        json!({
                            "name": spec.name,
                            "description": spec.description,
                            "inputSchema": spec.input_schema,
                        })
                    })
                    .collect();
                JsonRpcResponse::success(id, json!({ "tools": tools }))
            }
            "tools/call" => self.call_tool(id, request.params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            ),
        };
        Some(response)
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value::<CallToolParams>) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Invalid params: {e}"))
            }
            None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params"),
        };

        info!(tool = %params.name, "MCP tool call");
        let arguments = params.arguments.unwrap_or_else(|| json!({}));
        let result = match self.tools.call(&params.name, arguments).await {
            Ok(ToolOutput::Json(value)) => json!({
                "content": [{"type": "text", "text": value.to_string()}],
                "structuredContent": value,
                "isError": false,
            }),
            Ok(ToolOutput::Text(text)) => json!({
                "content": [{"type": "text", "text": text}],
                "isError": false,
            }),
            Err(ToolError::UnknownTool(name)) => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Tool not found: {name}"))
            }
            Err(e) => {
                warn!(tool = %params.name, error = %e, "MCP tool call failed");
                json!({
                    "content": [{"type": "text", "text": e.to_string()}],
                    "isError": true,
                })
            }
        };
        JsonRpcResponse::success(id, result)
    }

    /// HTTP endpoint accepting JSON-RPC messages on `path`
    pub fn router(self, path: &str) -> Router {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Router::new()
            .route(&path, post(post_message))
            .with_state(Arc::new(self))
    }

    /// Bind and serve until Ctrl-C
    pub async fn serve(self, host: &str, port: u16, path: &str) -> std::io::Result<()> {
        let listener = TcpListener::bind((host, port)).await?;
        info!(
            addr = %listener.local_addr()?,
            path,
            name = %self.name,
            "MCP server listening"
        );
        axum::serve(listener, self.router(path))
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn post_message(State(server): State<Arc<McpServer>>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return Json(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                format!("Parse error: {e}"),
            ))
            .into_response()
        }
    };

    // a null id would otherwise deserialize as a notification
    if value.get("id").is_some_and(Value::is_null) {
        return Json(JsonRpcResponse::error(
            Value::Null,
            INVALID_REQUEST,
            "Invalid request: id must not be null",
        ))
        .into_response();
    }

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::error(
                id,
                INVALID_REQUEST,
                format!("Invalid request: {e}"),
            ))
            .into_response()
        }
    };

    match server.handle(request).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down MCP server");
}
