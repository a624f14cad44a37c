//! Dispatcher wire protocol tests.
//!
//! Exercises `/mcp-filesystem` message handling directly: the
//! `call_tool_request` envelope and the MCP JSON-RPC 2.0 methods.

use filebot::server::{self, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND};
use filebot::{Dispatcher, PathGuard};
use serde_json::{Value, json};

fn dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
    Dispatcher::new(PathGuard::new(dir.path()).expect("guard"))
}

fn to_json(resp: &server::JsonRpcResponse) -> Value {
    serde_json::to_value(resp).expect("should serialize")
}

#[test]
fn test_json_rpc_request_parsing() {
    let req_json = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "0.1.0" }
        }
    });

    let req: server::JsonRpcRequest =
        serde_json::from_value(req_json).expect("should parse initialize request");

    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, Some(json!(1)));
}

#[test]
fn test_json_rpc_error_response_skips_result() {
    let resp = server::error_response(Some(json!(2)), METHOD_NOT_FOUND, "method not found", None);

    let json_str = serde_json::to_string(&resp).expect("should serialize");
    assert!(json_str.contains("-32601"));
    assert!(json_str.contains("method not found"));
    assert!(!json_str.contains("result"));
}

#[test]
fn test_initialize() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
    )
    .expect("response");

    let json = to_json(&resp);
    assert_eq!(json["result"]["serverInfo"]["name"], "filebot");
    assert_eq!(json["result"]["capabilities"]["tools"]["listChanged"], false);
}

#[test]
fn test_tools_list_complete() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
    )
    .expect("response");

    let json = to_json(&resp);
    let tools = json["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 5);

    for tool in tools {
        assert!(
            !tool["description"].as_str().unwrap_or_default().is_empty(),
            "tool {} missing description",
            tool["name"]
        );
        assert!(
            tool["inputSchema"].is_object(),
            "tool {} missing inputSchema",
            tool["name"]
        );
    }
}

#[test]
fn test_call_tool_envelope_lists_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.txt"), "a").expect("write");
    std::fs::create_dir(dir.path().join("b")).expect("mkdir");

    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({
            "type": "call_tool_request",
            "params": { "name": "list_directory", "arguments": { "path": "." } }
        }),
    )
    .expect("response");

    let json = to_json(&resp);
    assert_eq!(json["jsonrpc"], "2.0");
    assert_eq!(json["id"], 1);
    assert_eq!(json["result"]["content"][0]["type"], "text");
    assert_eq!(json["result"]["content"][0]["text"], "[FILE] a.txt\n[DIR] b");
    assert!(json["result"].get("isError").is_none());
}

#[test]
fn test_call_tool_envelope_handler_error_is_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({
            "type": "call_tool_request",
            "id": 9,
            "params": { "name": "read_file", "arguments": { "path": "missing.txt" } }
        }),
    )
    .expect("response");

    let json = to_json(&resp);
    assert_eq!(json["id"], 9);
    assert_eq!(json["result"]["isError"], true);
    assert!(json.get("error").is_none());
}

#[test]
fn test_call_tool_envelope_unknown_tool_is_error_object() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({
            "type": "call_tool_request",
            "params": { "name": "not_a_real_tool", "arguments": {} }
        }),
    )
    .expect("response");

    let err = resp.error.expect("error object");
    assert_eq!(err.code, INVALID_PARAMS);
    assert!(err.message.contains("Unknown tool: not_a_real_tool"));
    let available = err.data.expect("data")["available_tools"].clone();
    assert_eq!(available.as_array().map(Vec::len), Some(5));
}

#[test]
fn test_tools_call_missing_argument() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "write_file", "arguments": { "path": "x.txt" } }
        }),
    )
    .expect("response");

    let err = resp.error.expect("error object");
    assert_eq!(err.code, INVALID_PARAMS);
    assert!(err.message.contains("content"));
    assert!(!dir.path().join("x.txt").exists());
}

#[test]
fn test_tools_call_write_and_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dispatcher = dispatcher(&dir);

    let write = server::handle_message(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {
                "name": "write_file",
                "arguments": { "path": "test_write.txt", "content": "line1\nline2\n" }
            }
        }),
    )
    .expect("response");
    assert!(write.error.is_none());

    let read = server::handle_message(
        &dispatcher,
        &json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": { "name": "read_file", "arguments": { "path": "test_write.txt" } }
        }),
    )
    .expect("response");
    assert_eq!(to_json(&read)["result"]["content"][0]["text"], "line1\nline2\n");
}

#[test]
fn test_notification_gets_no_response() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
    );
    assert!(resp.is_none());
}

#[test]
fn test_wrong_version_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(
        &dispatcher(&dir),
        &json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}),
    )
    .expect("response");
    assert_eq!(resp.error.expect("error").code, INVALID_REQUEST);
}

#[test]
fn test_unrecognized_body_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let resp = server::handle_message(&dispatcher(&dir), &json!({"hello": "world"}))
        .expect("response");
    assert_eq!(resp.error.expect("error").code, INVALID_REQUEST);
}
