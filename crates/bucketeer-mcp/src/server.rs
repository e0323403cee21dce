// crates/bucketeer-mcp/src/server.rs
// ============================================================================
// Module: MCP Server
// Description: JSON-RPC 2.0 server over stdio.
// Purpose: Expose the feature-flag tools to an MCP host.
// Dependencies: bucketeer-mcp-client, bucketeer-mcp-config, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! The server reads one JSON-RPC message at a time from stdin and writes the
//! response to stdout. Two framings are accepted: newline-delimited JSON and
//! `Content-Length` headers. Each response uses the framing of its request.
//! Messages over the configured size limit are rejected without being
//! parsed. Notifications are consumed silently. End of input stops the loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::sync::Arc;

use bucketeer_mcp_client::BucketeerClient;
use bucketeer_mcp_client::BucketeerClientConfig;
use bucketeer_mcp_config::BucketeerMcpConfig;
use bucketeer_mcp_core::EnvironmentResolver;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::tools::ToolError;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MCP protocol revision implemented by this server.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Server name reported during `initialize`.
pub const SERVER_NAME: &str = "bucketeer-mcp";
/// Header announcing a framed message body.
const CONTENT_LENGTH_HEADER: &str = "content-length:";

// ============================================================================
// SECTION: MCP Server
// ============================================================================

/// MCP server instance.
pub struct McpServer {
    /// Tool router for request dispatch.
    router: ToolRouter,
    /// Maximum inbound message size in bytes.
    max_body_bytes: usize,
}

impl McpServer {
    /// Builds a server backed by the Bucketeer REST client.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the client cannot be created.
    pub fn from_config(config: &BucketeerMcpConfig) -> Result<Self, McpServerError> {
        let client_config =
            BucketeerClientConfig::new(&config.bucketeer.base_url(), config.bucketeer.api_key.clone())
                .map_err(|err| McpServerError::Config(err.to_string()))?
                .with_timeout(config.bucketeer.request_timeout());
        let client =
            BucketeerClient::new(client_config).map_err(|err| McpServerError::Init(err.to_string()))?;
        let environments = EnvironmentResolver::new(config.bucketeer.environment_id.clone());
        let router = ToolRouter::new(Arc::new(client), environments);
        Ok(Self::new(router, config.server.max_body_bytes))
    }

    /// Creates a server around an existing router.
    #[must_use]
    pub const fn new(router: ToolRouter, max_body_bytes: usize) -> Self {
        Self {
            router,
            max_body_bytes,
        }
    }

    /// Serves requests over the process stdin and stdout.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Transport`] when stdio fails.
    pub fn serve_stdio(&self) -> Result<(), McpServerError> {
        info!(protocol = PROTOCOL_VERSION, "serving mcp over stdio");
        self.serve(io::stdin().lock(), io::stdout().lock())
    }

    /// Serves requests from `reader`, writing responses to `writer`, until
    /// the reader reaches end of input.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError::Transport`] when reading or writing fails.
    pub fn serve(&self, reader: impl Read, mut writer: impl Write) -> Result<(), McpServerError> {
        let mut reader = BufReader::new(reader);
        while let Some(message) = read_message(&mut reader, self.max_body_bytes)? {
            let response = match message.body {
                Inbound::Payload(bytes) => self.handle_message(&bytes),
                Inbound::Oversized => {
                    warn!(limit = self.max_body_bytes, "rejected oversized message");
                    Some(JsonRpcResponse::error(Value::Null, -32600, "payload too large"))
                }
            };
            if let Some(response) = response {
                let payload = serde_json::to_vec(&response).map_err(|_| {
                    McpServerError::Transport("json-rpc serialization failed".to_string())
                })?;
                write_message(&mut writer, message.framing, &payload)?;
            }
        }
        info!("stdin closed; shutting down");
        Ok(())
    }

    /// Handles one raw JSON-RPC message; `None` means no response is due.
    fn handle_message(&self, bytes: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(_) => return Some(JsonRpcResponse::error(Value::Null, -32700, "parse error")),
        };
        let fallback_id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(_) => return Some(JsonRpcResponse::error(fallback_id, -32600, "invalid request")),
        };
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, -32600, "invalid json-rpc version"));
        }
        Some(self.handle_request(id, &request.method, request.params))
    }

    /// Dispatches a JSON-RPC request by method.
    fn handle_request(&self, id: Value, method: &str, params: Option<Value>) -> JsonRpcResponse {
        match method {
            "initialize" => JsonRpcResponse::result(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") }
                }),
            ),
            "ping" => JsonRpcResponse::result(id, json!({})),
            "tools/list" => match serde_json::to_value(ToolListResult {
                tools: self.router.list_tools(),
            }) {
                Ok(value) => JsonRpcResponse::result(id, value),
                Err(_) => jsonrpc_error(id, &ToolError::Serialization),
            },
            "tools/call" => {
                let params = params.unwrap_or(Value::Null);
                let Ok(call) = serde_json::from_value::<ToolCallParams>(params) else {
                    return JsonRpcResponse::error(id, -32602, "invalid tool params");
                };
                let outcome = self
                    .router
                    .handle_tool_call(&call.name, &call.arguments)
                    .and_then(|result| serde_json::to_value(result).map_err(|_| ToolError::Serialization));
                match outcome {
                    Ok(value) => JsonRpcResponse::result(id, value),
                    Err(err) => jsonrpc_error(id, &err),
                }
            }
            _ => JsonRpcResponse::error(id, -32601, "method not found"),
        }
    }
}

// ============================================================================
// SECTION: JSON-RPC Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC protocol version.
    jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    id: Option<Value>,
    /// Method name.
    method: String,
    /// Optional parameters payload.
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    jsonrpc: &'static str,
    /// Request identifier.
    id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success response.
    const fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
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

/// JSON-RPC error payload.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    /// Error code.
    code: i64,
    /// Human-readable error message.
    message: String,
}

/// Tool call parameters for JSON-RPC requests.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Value,
}

/// Tool list response payload.
#[derive(Debug, Serialize)]
struct ToolListResult {
    /// Registered tool definitions.
    tools: Vec<crate::contract::ToolDefinition>,
}

/// Builds a JSON-RPC error response for a routing failure.
fn jsonrpc_error(id: Value, error: &ToolError) -> JsonRpcResponse {
    let code = match error {
        ToolError::UnknownTool(_) => -32601,
        ToolError::Serialization => -32603,
    };
    JsonRpcResponse::error(id, code, error.to_string())
}

// ============================================================================
// SECTION: Framing Helpers
// ============================================================================

/// Wire framing used by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// One JSON document per line.
    Line,
    /// `Content-Length` header block followed by the body.
    ContentLength,
}

/// Body of an inbound message.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    /// Message bytes within the size limit.
    Payload(Vec<u8>),
    /// Message exceeded the size limit and was discarded.
    Oversized,
}

/// One inbound message and the framing it arrived in.
#[derive(Debug, PartialEq, Eq)]
struct Message {
    /// Framing to answer in.
    framing: Framing,
    /// Message body.
    body: Inbound,
}

/// Reads the next message, skipping blank lines. `None` means end of input.
fn read_message(
    reader: &mut BufReader<impl Read>,
    max_body_bytes: usize,
) -> Result<Option<Message>, McpServerError> {
    loop {
        let Some(line) = read_bounded_line(reader, max_body_bytes)? else {
            return Ok(None);
        };
        let Inbound::Payload(line) = line else {
            return Ok(Some(Message {
                framing: Framing::Line,
                body: Inbound::Oversized,
            }));
        };
        let text = String::from_utf8_lossy(&line);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.to_ascii_lowercase().starts_with(CONTENT_LENGTH_HEADER) {
            let length = parse_content_length(trimmed)?;
            let body = read_framed_body(reader, length, max_body_bytes)?;
            return Ok(Some(Message {
                framing: Framing::ContentLength,
                body,
            }));
        }
        return Ok(Some(Message {
            framing: Framing::Line,
            body: Inbound::Payload(trimmed.as_bytes().to_vec()),
        }));
    }
}

/// Reads one line of at most `max_bytes`, discarding the rest of longer lines.
fn read_bounded_line(
    reader: &mut BufReader<impl Read>,
    max_bytes: usize,
) -> Result<Option<Inbound>, McpServerError> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut buf = Vec::new();
    let read = reader
        .by_ref()
        .take(limit)
        .read_until(b'\n', &mut buf)
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    if read == 0 {
        return Ok(None);
    }
    if buf.len() > max_bytes && buf.last() != Some(&b'\n') {
        skip_line(reader)?;
        return Ok(Some(Inbound::Oversized));
    }
    Ok(Some(Inbound::Payload(buf)))
}

/// Consumes input through the next newline or EOF without buffering it.
fn skip_line(reader: &mut BufReader<impl Read>) -> Result<(), McpServerError> {
    loop {
        let chunk = reader
            .fill_buf()
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if chunk.is_empty() {
            return Ok(());
        }
        match chunk.iter().position(|byte| *byte == b'\n') {
            Some(index) => {
                reader.consume(index + 1);
                return Ok(());
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}

/// Parses a `Content-Length` header line.
fn parse_content_length(line: &str) -> Result<usize, McpServerError> {
    line.get(CONTENT_LENGTH_HEADER.len()..)
        .map(str::trim)
        .and_then(|value| value.parse::<usize>().ok())
        .ok_or_else(|| McpServerError::Transport("invalid content length".to_string()))
}

/// Reads the rest of a framed header block and then the body.
fn read_framed_body(
    reader: &mut BufReader<impl Read>,
    length: usize,
    max_body_bytes: usize,
) -> Result<Inbound, McpServerError> {
    let mut line = String::new();
    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if bytes == 0 {
            return Err(McpServerError::Transport("stdio closed".to_string()));
        }
        if line.trim().is_empty() {
            break;
        }
    }
    if length > max_body_bytes {
        let expected = u64::try_from(length).unwrap_or(u64::MAX);
        let skipped = io::copy(&mut reader.by_ref().take(expected), &mut io::sink())
            .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
        if skipped < expected {
            return Err(McpServerError::Transport("stdio closed".to_string()));
        }
        return Ok(Inbound::Oversized);
    }
    let mut buf = vec![0u8; length];
    reader
        .read_exact(&mut buf)
        .map_err(|_| McpServerError::Transport("stdio read failed".to_string()))?;
    Ok(Inbound::Payload(buf))
}

/// Writes a response in the given framing.
fn write_message(
    writer: &mut impl Write,
    framing: Framing,
    payload: &[u8],
) -> Result<(), McpServerError> {
    let map_err = |_| McpServerError::Transport("stdio write failed".to_string());
    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            writer.write_all(header.as_bytes()).map_err(map_err)?;
            writer.write_all(payload).map_err(map_err)?;
        }
        Framing::Line => {
            writer.write_all(payload).map_err(map_err)?;
            writer.write_all(b"\n").map_err(map_err)?;
        }
    }
    writer.flush().map_err(map_err)
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// MCP server errors.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only framing assertions."
    )]

    use std::io::BufReader;
    use std::io::Cursor;
    use std::sync::Arc;

    use bucketeer_mcp_client::BucketeerClient;
    use bucketeer_mcp_client::BucketeerClientConfig;
    use bucketeer_mcp_core::EnvironmentResolver;
    use serde_json::Value;
    use serde_json::json;

    use super::Framing;
    use super::Inbound;
    use super::McpServer;
    use super::read_message;
    use crate::tools::ToolRouter;

    /// Sample request body.
    const PAYLOAD: &[u8] = br#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;

    /// Frames `payload` with a Content-Length header.
    fn framed(payload: &[u8]) -> Vec<u8> {
        let mut bytes = format!("Content-Length: {}\r\n\r\n", payload.len()).into_bytes();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn read_message_rejects_framed_payload_over_limit() {
        let mut reader = BufReader::new(Cursor::new(framed(PAYLOAD)));
        let message = read_message(&mut reader, PAYLOAD.len() - 1).unwrap().unwrap();
        assert_eq!(message.framing, Framing::ContentLength);
        assert_eq!(message.body, Inbound::Oversized);
        assert!(read_message(&mut reader, PAYLOAD.len()).unwrap().is_none());
    }

    #[test]
    fn read_message_accepts_framed_payload_at_limit() {
        let mut reader = BufReader::new(Cursor::new(framed(PAYLOAD)));
        let message = read_message(&mut reader, PAYLOAD.len()).unwrap().unwrap();
        assert_eq!(message.framing, Framing::ContentLength);
        assert_eq!(message.body, Inbound::Payload(PAYLOAD.to_vec()));
    }

    #[test]
    fn read_message_reads_lines_and_skips_blank_lines() {
        let mut input = b"\n\n".to_vec();
        input.extend_from_slice(PAYLOAD);
        input.push(b'\n');
        let mut reader = BufReader::new(Cursor::new(input));
        let message = read_message(&mut reader, 1024).unwrap().unwrap();
        assert_eq!(message.framing, Framing::Line);
        assert_eq!(message.body, Inbound::Payload(PAYLOAD.to_vec()));
        assert!(read_message(&mut reader, 1024).unwrap().is_none());
    }

    #[test]
    fn read_message_discards_oversized_line_and_continues() {
        let mut input = vec![b'x'; 64];
        input.push(b'\n');
        input.extend_from_slice(PAYLOAD);
        input.push(b'\n');
        let mut reader = BufReader::new(Cursor::new(input));
        let first = read_message(&mut reader, PAYLOAD.len() + 1).unwrap().unwrap();
        assert_eq!(first.body, Inbound::Oversized);
        let second = read_message(&mut reader, PAYLOAD.len() + 1).unwrap().unwrap();
        assert_eq!(second.body, Inbound::Payload(PAYLOAD.to_vec()));
    }

    #[test]
    fn read_message_skips_line_far_beyond_limit_in_small_chunks() {
        let limit = PAYLOAD.len() + 1;
        let mut input = vec![b'x'; limit * 64];
        input.push(b'\n');
        input.extend_from_slice(PAYLOAD);
        input.push(b'\n');
        input.extend_from_slice(&vec![b'y'; limit * 8]);
        let mut reader = BufReader::with_capacity(16, Cursor::new(input));
        let first = read_message(&mut reader, limit).unwrap().unwrap();
        assert_eq!(first.body, Inbound::Oversized);
        let second = read_message(&mut reader, limit).unwrap().unwrap();
        assert_eq!(second.body, Inbound::Payload(PAYLOAD.to_vec()));
        let unterminated = read_message(&mut reader, limit).unwrap().unwrap();
        assert_eq!(unterminated.body, Inbound::Oversized);
        assert!(read_message(&mut reader, limit).unwrap().is_none());
    }

    /// Builds a server whose client points at a closed local port.
    fn server(max_body_bytes: usize) -> McpServer {
        let config = BucketeerClientConfig::new("http://127.0.0.1:9", "key").unwrap();
        let client = BucketeerClient::new(config).unwrap();
        let router = ToolRouter::new(Arc::new(client), EnvironmentResolver::new(None));
        McpServer::new(router, max_body_bytes)
    }

    /// Runs `input` through the server and parses each output line as JSON.
    fn exchange_lines(input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        server(4096).serve(Cursor::new(input.as_bytes().to_vec()), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn serve_answers_requests_and_skips_notifications() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/list"}"#,
            "\n"
        );
        let responses = exchange_lines(input);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["result"]["protocolVersion"], json!("2024-11-05"));
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], json!("bucketeer-mcp"));
        assert_eq!(responses[1], json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
        assert_eq!(responses[2]["result"]["tools"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn serve_maps_protocol_errors_to_codes() {
        let input = concat!(
            "{not json\n",
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"dropFeatureFlag"}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"arguments":{}}}"#,
            "\n"
        );
        let codes: Vec<Value> =
            exchange_lines(input).iter().map(|response| response["error"]["code"].clone()).collect();
        assert_eq!(codes, vec![json!(-32700), json!(-32600), json!(-32601), json!(-32601), json!(-32602)]);
    }

    #[test]
    fn serve_reports_tool_failures_as_results() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"getFeatureFlag","arguments":{"id":"f1"}}}"#,
            "\n"
        );
        let responses = exchange_lines(input);
        let result = &responses[0]["result"];
        assert_eq!(result["isError"], json!(true));
        let text = result["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["kind"], json!("invalid_argument"));
    }

    #[test]
    fn serve_answers_framed_requests_in_kind() {
        let mut output = Vec::new();
        server(4096).serve(Cursor::new(framed(PAYLOAD)), &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let (header, body) = text.split_once("\r\n\r\n").unwrap();
        assert_eq!(header, format!("Content-Length: {}", body.len()));
        let response: Value = serde_json::from_str(body).unwrap();
        assert_eq!(response["id"], json!(1));
    }
}
