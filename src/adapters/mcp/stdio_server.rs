//! MCP stdio transport: JSON-RPC 2.0 over stdin/stdout.
//!
//! Protocol: newline-delimited JSON-RPC 2.0 on stdin/stdout. Logging goes
//! to stderr; stdout is reserved for protocol messages. The transport only
//! validates envelopes and translates errors — business logic lives behind
//! the dispatcher.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::errors::ToolError;
use crate::server::Server;

/// MCP protocol revision answered in the `initialize` handshake.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Stdio MCP server over the shared dispatcher.
pub struct StdioServer {
    server: Arc<Server>,
}

impl StdioServer {
    pub fn new(server: Arc<Server>) -> Self {
        Self { server }
    }

    /// Run the read loop until stdin closes or shutdown fires.
    pub async fn run(&self, mut shutdown: tokio::sync::broadcast::Receiver<()>) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        tracing::info!("stdio transport connected");

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line,
                _ = shutdown.recv() => break,
            };
            let Ok(Some(line)) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut bytes = response.into_bytes();
                bytes.push(b'\n');
                stdout.write_all(&bytes).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdio transport closed");
        Ok(())
    }

    /// Handle one frame. Notifications produce no response.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => return Some(error_response(Value::Null, -32700, &format!("Parse error: {e}"), None)),
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        if !request.is_object() || request.get("method").map(|m| !m.is_string()).unwrap_or(false) {
            return Some(error_response(id, -32600, "Invalid request envelope", None));
        }
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        if method.is_empty() {
            return Some(error_response(id, -32600, "Missing method", None));
        }
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        match method {
            "initialize" => Some(self.handle_initialize(id)),
            "notifications/initialized" => None,
            "tools/list" => Some(success_response(id, self.server.dispatcher.registry().listing())),
            "tools/call" => Some(self.handle_tools_call(id, &params).await),
            "resources/list" => Some(success_response(id, self.server.resources.list())),
            "resources/read" => Some(self.handle_resources_read(id, &params).await),
            other => Some(error_response(id, -32601, &format!("Method not found: {other}"), None)),
        }
    }

    fn handle_initialize(&self, id: Value) -> String {
        success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": "aoma-mesh",
                    "version": self.server.ctx.env.version,
                }
            }),
        )
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return error_response(id, -32602, "tools/call requires a tool name", None);
        };
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match self.server.dispatcher.call_envelope(name, arguments).await {
            Ok(result) => success_response(id, result),
            Err(err) => tool_error_response(id, &err),
        }
    }

    async fn handle_resources_read(&self, id: Value, params: &Value) -> String {
        let Some(uri) = params.get("uri").and_then(Value::as_str) else {
            return error_response(id, -32602, "resources/read requires a uri", None);
        };
        match self.server.resources.read(uri).await {
            Ok(contents) => success_response(id, contents),
            Err(err) => tool_error_response(id, &err),
        }
    }
}

fn success_response(id: Value, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string()
}

fn error_response(id: Value, code: i32, message: &str, data: Option<Value>) -> String {
    let mut error = json!({ "code": code, "message": message });
    if let Some(data) = data {
        error["data"] = data;
    }
    json!({ "jsonrpc": "2.0", "id": id, "error": error }).to_string()
}

fn tool_error_response(id: Value, err: &ToolError) -> String {
    error_response(id, err.code(), &err.to_string(), err.data())
}
