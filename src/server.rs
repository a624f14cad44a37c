//! Dispatcher wire protocol — JSON-RPC 2.0 envelopes for `/mcp-filesystem`.
//!
//! Two request shapes are accepted on the same endpoint:
//!
//! 1. The `call_tool_request` envelope used between cooperating services:
//!    `{"type": "call_tool_request", "params": {"name", "arguments"}}`.
//! 2. Plain MCP JSON-RPC 2.0 requests: `initialize`, `tools/list`,
//!    `tools/call`, `ping`.
//!
//! Both answer with `{"jsonrpc": "2.0", "id", "result"}` on success or an
//! `error` object for caller errors. Tool execution failures are a normal
//! result with `isError: true`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::dispatch::{Dispatcher, StructuredCommand};
use crate::error::FilebotError;
use crate::tools::ToolCallResult;

/// Envelope `type` for service-to-service tool calls.
pub const CALL_TOOL_REQUEST: &str = "call_tool_request";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

const PROTOCOL_VERSION: &str = "2025-06-18";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// ---------------------------------------------------------------------------
// Service envelope
// ---------------------------------------------------------------------------

/// `call_tool_request` envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallToolEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub params: CallToolParams,
}

/// Tool call params shared by the envelope and MCP `tools/call`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallToolParams {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub arguments: Value,
}

impl CallToolEnvelope {
    pub fn new(command: &StructuredCommand) -> Self {
        Self {
            kind: CALL_TOOL_REQUEST.to_owned(),
            id: None,
            params: CallToolParams {
                name: Value::from(command.tool_name.as_str()),
                arguments: Value::Object(command.arguments.clone()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// MCP protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsCapability {
    list_changed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
}

/// MCP tool definition for `tools/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDefinition>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Handle one `/mcp-filesystem` request body.
///
/// Returns `None` for JSON-RPC notifications, which get no response.
pub fn handle_message(dispatcher: &Dispatcher, body: &Value) -> Option<JsonRpcResponse> {
    if body.get("type").and_then(Value::as_str) == Some(CALL_TOOL_REQUEST) {
        return Some(handle_call_tool_envelope(dispatcher, body));
    }

    if body.get("method").is_none() {
        let id = body.get("id").cloned();
        return Some(error_response(
            id,
            INVALID_REQUEST,
            "invalid request: expected a call_tool_request envelope or a JSON-RPC 2.0 request",
            None,
        ));
    }

    let request: JsonRpcRequest = match serde_json::from_value(body.clone()) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "invalid JSON-RPC request");
            return Some(error_response(
                body.get("id").cloned(),
                INVALID_REQUEST,
                &format!("invalid request: {e}"),
                None,
            ));
        }
    };

    // JSON-RPC 2.0: "jsonrpc" MUST be exactly "2.0".
    if request.jsonrpc != "2.0" {
        warn!(version = request.jsonrpc, "invalid JSON-RPC version");
        return Some(error_response(
            request.id.clone(),
            INVALID_REQUEST,
            &format!(
                "invalid request: jsonrpc version must be \"2.0\", got \"{}\"",
                request.jsonrpc
            ),
            None,
        ));
    }

    let response = dispatch_method(dispatcher, &request);
    if request.id.is_none() {
        debug!(method = request.method, "notification handled (no response)");
        return None;
    }
    response
}

fn handle_call_tool_envelope(dispatcher: &Dispatcher, body: &Value) -> JsonRpcResponse {
    // Envelope callers historically omit the id; answer with 1.
    let id = Some(body.get("id").cloned().unwrap_or_else(|| json!(1)));
    let params = match body
        .get("params")
        .cloned()
        .map(serde_json::from_value::<CallToolParams>)
    {
        Some(Ok(p)) => p,
        Some(Err(e)) => {
            return error_response(id, INVALID_PARAMS, &format!("invalid params: {e}"), None);
        }
        None => return error_response(id, INVALID_PARAMS, "params is required", None),
    };
    call_tool(dispatcher, id, &params)
}

fn dispatch_method(dispatcher: &Dispatcher, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => Some(handle_initialize(req)),
        "notifications/initialized" => {
            info!("client initialized");
            None
        }
        "tools/list" => Some(handle_tools_list(dispatcher, req)),
        "tools/call" => Some(handle_tools_call(dispatcher, req)),
        "ping" => Some(success_response(req.id.clone(), &json!({}))),
        _ => {
            warn!(method = req.method, "unknown method");
            Some(error_response(
                req.id.clone(),
                METHOD_NOT_FOUND,
                &format!("method not found: {}", req.method),
                None,
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_owned(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: "filebot".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        },
    };
    success_response(req.id.clone(), &result)
}

fn handle_tools_list(dispatcher: &Dispatcher, req: &JsonRpcRequest) -> JsonRpcResponse {
    let tools = dispatcher
        .catalog()
        .map(|entry| ToolDefinition {
            name: entry.name.to_owned(),
            description: entry.description.to_owned(),
            input_schema: entry.input_schema(),
        })
        .collect();
    success_response(req.id.clone(), &ToolsListResult { tools })
}

fn handle_tools_call(dispatcher: &Dispatcher, req: &JsonRpcRequest) -> JsonRpcResponse {
    let params: CallToolParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return error_response(
                req.id.clone(),
                INVALID_PARAMS,
                &format!("invalid tools/call params: {e}"),
                None,
            );
        }
    };
    call_tool(dispatcher, req.id.clone(), &params)
}

fn call_tool(dispatcher: &Dispatcher, id: Option<Value>, params: &CallToolParams) -> JsonRpcResponse {
    let outcome = StructuredCommand::from_loose(Some(&params.name), Some(&params.arguments))
        .and_then(|command| dispatcher.try_dispatch(&command));

    match outcome {
        Ok(outcome) => success_response(id, &ToolCallResult::from(outcome)),
        Err(e) => {
            warn!(tool = %params.name, error = %e, "tool call rejected");
            let data = match &e {
                FilebotError::UnknownTool { available, .. } => {
                    Some(json!({ "available_tools": available }))
                }
                _ => None,
            };
            error_response(id, INVALID_PARAMS, &e.to_string(), data)
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn success_response(id: Option<Value>, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(v),
            error: None,
        },
        Err(e) => {
            error!(error = %e, "failed to serialize success response");
            error_response(
                id,
                INTERNAL_ERROR,
                &format!("internal error: failed to serialize result: {e}"),
                None,
            )
        }
    }
}

/// Build a JSON-RPC error response.
pub fn error_response(
    id: Option<Value>,
    code: i64,
    message: &str,
    data: Option<Value>,
) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_owned(),
            data,
        }),
    }
}
