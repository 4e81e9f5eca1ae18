//! MCP stdio server
//!
//! Reads newline-delimited JSON-RPC requests and handles each one in its own
//! task, writing one response line per request as it completes. Responses may
//! arrive out of order and are matched by id. Notifications get no response.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, ToolCallParams, INTERNAL_ERROR, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::tools::{self, ToolContext};

const SERVER_NAME: &str = "skillzmarket";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct McpServer {
    ctx: ToolContext,
}

impl McpServer {
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    /// Serve on the process's stdin/stdout until EOF or cancellation.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout, cancel).await
    }

    /// Main event loop over an arbitrary line reader and writer.
    ///
    /// On EOF the loop waits for in-flight requests before returning.
    /// Cancellation returns immediately and aborts anything still running.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W, cancel: CancellationToken) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut in_flight: JoinSet<Option<JsonRpcResponse>> = JoinSet::new();
        let mut input_open = true;

        while input_open || !in_flight.is_empty() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    match joined {
                        Ok(Some(response)) => write_response(&mut writer, &response).await?,
                        Ok(None) => {}
                        Err(e) => warn!("Request task failed: {}", e),
                    }
                }
                line = lines.next_line(), if input_open => {
                    match line.context("Failed to read MCP request")? {
                        Some(line) => {
                            let server = self.clone();
                            in_flight.spawn(async move { server.handle_line(&line).await });
                        }
                        None => {
                            info!("Input closed, shutting down");
                            input_open = false;
                        }
                    }
                }
            }
        }

        in_flight.abort_all();
        Ok(())
    }

    /// Handle one raw input line. Returns `None` when no response is due.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                warn!("Unparseable MCP message: {}", e);
                return Some(JsonRpcResponse::error(Value::Null, PARSE_ERROR, e.to_string()));
            }
        };

        debug!("<- {} (id={:?})", request.method, request.id);

        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    async fn handle_request(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let id = req.id.unwrap_or(Value::Null);

        match req.method.as_str() {
            "initialize" => JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION
                    }
                }),
            ),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(
                id,
                json!({ "tools": tools::tool_descriptors() }),
            ),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", other),
            ),
        }
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> JsonRpcResponse {
        let call: ToolCallParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
        };

        let result = tools::dispatch(&call.name, call.arguments, &self.ctx).await;

        match serde_json::to_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        }
    }
}

async fn write_response<W>(writer: &mut W, response: &JsonRpcResponse) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut output = serde_json::to_vec(response).context("Failed to encode MCP response")?;
    output.push(b'\n');
    writer
        .write_all(&output)
        .await
        .context("Failed to write MCP response")?;
    writer.flush().await.context("Failed to flush MCP response")?;
    Ok(())
}
