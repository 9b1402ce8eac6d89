//! Minimal MCP server over stdio
//!
//! Speaks newline-delimited JSON-RPC 2.0. Only the tool surface is
//! implemented: `initialize`, `ping`, `tools/list` and `tools/call`.
//! Each tool call runs in its own task so a slow TTS request doesn't block
//! the next message; responses are written from a single place.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::tools::{SpeechTools, ToolResult, tool_definitions};

pub const SERVER_NAME: &str = "summarize-mcp";

/// Protocol version offered when the client asks for one we don't know
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request or notification (no `id`)
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
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
    arguments: Value,
}

fn call_tool_result(result: ToolResult) -> Value {
    json!({
        "content": [{ "type": "text", "text": result.text }],
        "isError": result.is_error,
    })
}

fn negotiate_version(params: Option<&Value>) -> &'static str {
    let requested = params
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);

    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|v| Some(*v) == requested)
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

pub struct McpServer {
    tools: Arc<SpeechTools>,
}

impl McpServer {
    pub fn new(tools: Arc<SpeechTools>) -> Self {
        Self { tools }
    }

    /// Serve on the process's stdin/stdout until stdin closes
    pub async fn run_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.serve(stdin, &mut stdout).await
    }

    /// Read requests from `reader` until EOF, then wait for in-flight tool calls to answer
    pub async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut tx = Some(tx);
        // Partial reads stay in `buf` if the other branch wins the select
        let mut buf = Vec::new();

        loop {
            tokio::select! {
                read = reader.read_until(b'\n', &mut buf), if tx.is_some() => {
                    let read = read.context("Failed to read from client")?;
                    if read == 0 {
                        log::debug!("Client closed input");
                        tx = None;
                    } else if let Some(sender) = &tx {
                        match std::str::from_utf8(&buf) {
                            Ok(line) => self.handle_line(line, sender),
                            Err(e) => {
                                log::warn!("Ignoring message that is not UTF-8: {}", e);
                                let _ = sender.send(JsonRpcResponse::error(
                                    Value::Null,
                                    PARSE_ERROR,
                                    format!("Parse error: {}", e),
                                ));
                            }
                        }
                        buf.clear();
                    }
                }
                response = rx.recv() => match response {
                    Some(response) => write_message(writer, &response).await?,
                    None => break,
                },
            }
        }

        Ok(())
    }

    fn handle_line(&self, line: &str, tx: &UnboundedSender<JsonRpcResponse>) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let request: JsonRpcRequest = match serde_json::from_str::<Value>(line) {
            Ok(value) => match serde_json::from_value(value) {
                Ok(request) => request,
                Err(e) => {
                    let _ = tx.send(JsonRpcResponse::error(
                        Value::Null,
                        INVALID_REQUEST,
                        format!("Invalid request: {}", e),
                    ));
                    return;
                }
            },
            Err(e) => {
                log::warn!("Ignoring unparsable message: {}", e);
                let _ = tx.send(JsonRpcResponse::error(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
                return;
            }
        };

        if request.jsonrpc != "2.0" {
            log::debug!("Request without jsonrpc 2.0 marker: {}", request.method);
        }

        let Some(id) = request.id.clone() else {
            log::debug!("Notification: {}", request.method);
            return;
        };

        log::debug!("Request {}: {}", id, request.method);
        match request.method.as_str() {
            "initialize" => {
                let version = negotiate_version(request.params.as_ref());
                let _ = tx.send(JsonRpcResponse::result(
                    id,
                    json!({
                        "protocolVersion": version,
                        "capabilities": { "tools": { "listChanged": false } },
                        "serverInfo": {
                            "name": SERVER_NAME,
                            "version": env!("CARGO_PKG_VERSION"),
                        },
                    }),
                ));
            }
            "ping" => {
                let _ = tx.send(JsonRpcResponse::result(id, json!({})));
            }
            "tools/list" => {
                let _ = tx.send(JsonRpcResponse::result(
                    id,
                    json!({ "tools": tool_definitions() }),
                ));
            }
            "tools/call" => {
                let params: CallToolParams =
                    match serde_json::from_value(request.params.unwrap_or(Value::Null)) {
                        Ok(params) => params,
                        Err(e) => {
                            let _ = tx.send(JsonRpcResponse::error(
                                id,
                                INVALID_PARAMS,
                                format!("Invalid params: {}", e),
                            ));
                            return;
                        }
                    };

                let tools = self.tools.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = tools.call(&params.name, params.arguments).await;
                    let _ = tx.send(JsonRpcResponse::result(id, call_tool_result(result)));
                });
            }
            other => {
                let _ = tx.send(JsonRpcResponse::error(
                    id,
                    METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                ));
            }
        }
    }
}

async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, response: &JsonRpcResponse) -> Result<()> {
    let mut line = serde_json::to_vec(response).context("Failed to serialize response")?;
    line.push(b'\n');
    writer
        .write_all(&line)
        .await
        .context("Failed to write response")?;
    writer.flush().await.context("Failed to flush response")?;
    Ok(())
}
