//! HTTP surface — axum routes over the dispatcher and orchestrator.
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /mcp-filesystem` | dispatcher wire protocol (see [`crate::server`]) |
//! | `POST /api/command` | structured invocation, in-process |
//! | `POST /mcp-command` | structured invocation through the dispatch target |
//! | `POST /nl-command` | free-text invocation |
//! | `GET /api/tools` | tool catalog |
//! | `GET /api/allowed-directories` | sandbox root |
//! | `GET /status`, `GET /health` | liveness |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::FilebotConfig;
use crate::dispatch::{Dispatcher, StructuredCommand};
use crate::error::{FilebotError, FilebotResult};
use crate::orchestrator::{DispatchTarget, OrchestratedResult, Orchestrator, TranslationFailure};
use crate::remote::RemoteDispatcher;
use crate::sandbox::PathGuard;
use crate::server::{self, PARSE_ERROR};
use crate::tools::ToolCallResult;
use crate::translate::{OllamaBackend, Translator};

/// Shared, read-only state for every request.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Wire the components described by `config`.
    pub fn from_config(config: &FilebotConfig) -> FilebotResult<Self> {
        let guard = PathGuard::new(&config.allowed_root)?;
        let dispatcher = Arc::new(Dispatcher::new(guard));

        let backend = Arc::new(OllamaBackend::from_config(config)?);
        let target = match RemoteDispatcher::from_config(config)? {
            Some(remote) => DispatchTarget::Remote(remote),
            None => DispatchTarget::Local(Arc::clone(&dispatcher)),
        };
        let orchestrator = Arc::new(Orchestrator::new(Translator::new(backend), target));

        Ok(Self {
            dispatcher,
            orchestrator,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp-filesystem", post(mcp_filesystem))
        .route("/api/command", post(api_command))
        .route("/mcp-command", post(mcp_command))
        .route("/nl-command", post(nl_command))
        .route("/api/tools", get(api_tools))
        .route("/api/allowed-directories", get(allowed_directories))
        .route("/status", get(status))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind the configured port and serve until the process is stopped.
pub async fn serve(config: FilebotConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).context("failed to initialize filebot")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let target = match state.orchestrator.target() {
        DispatchTarget::Local(_) => "in-process".to_owned(),
        DispatchTarget::Remote(remote) => remote.endpoint().to_owned(),
    };
    info!(
        %addr,
        allowed_root = %state.dispatcher.guard().root().display(),
        backend = config.backend_url,
        model = config.model,
        dispatcher = target,
        "filebot listening"
    );

    axum::serve(listener, router(state))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Dispatcher endpoint
// ---------------------------------------------------------------------------

async fn mcp_filesystem(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparseable dispatcher request");
            let resp = server::error_response(None, PARSE_ERROR, &format!("parse error: {e}"), None);
            return Json(resp).into_response();
        }
    };

    match server::handle_message(&state.dispatcher, &body) {
        Some(resp) => Json(resp).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

// ---------------------------------------------------------------------------
// Structured invocation
// ---------------------------------------------------------------------------

fn example_command() -> Value {
    json!({ "tool_code": "list_directory", "arguments": { "path": "." } })
}

fn example_free_text() -> Value {
    json!({ "command": "show me the files in this folder" })
}

/// Decode a request body, answering malformed JSON in the handlers' own shape.
fn parse_body(body: &Bytes, example: Value) -> Result<Value, Response> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "unparseable request body");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid JSON body: {e}"), "example": example })),
        )
            .into_response()
    })
}

fn parse_structured(body: &Value) -> Result<StructuredCommand, Response> {
    StructuredCommand::from_loose(body.get("tool_code"), body.get("arguments")).map_err(|e| match e {
        FilebotError::EmptyCommand => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "tool_code is required", "example": example_command() })),
        )
            .into_response(),
        other => caller_error(&other),
    })
}

fn caller_error(err: &FilebotError) -> Response {
    let body = match err {
        FilebotError::UnknownTool { available, .. } => {
            json!({ "error": err.to_string(), "available_tools": available })
        }
        _ => json!({ "error": err.to_string() }),
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn flat_result(tool: &str, result: &ToolCallResult) -> Value {
    json!({
        "success": true,
        "tool": tool,
        "result": result.text(),
        "isError": result.is_error,
    })
}

async fn api_command(State(state): State<AppState>, body: Bytes) -> Response {
    let command = match parse_body(&body, example_command()).and_then(|b| parse_structured(&b)) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.dispatcher.try_dispatch(&command) {
        Ok(outcome) => {
            let result = ToolCallResult::from(outcome);
            Json(flat_result(&command.tool_name, &result)).into_response()
        }
        Err(e) => caller_error(&e),
    }
}

async fn mcp_command(State(state): State<AppState>, body: Bytes) -> Response {
    let command = match parse_body(&body, example_command()).and_then(|b| parse_structured(&b)) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match state.orchestrator.target().forward(&command).await {
        Ok(result) => Json(flat_result(&command.tool_name, &result)).into_response(),
        Err(e) if e.is_caller_error() => caller_error(&e),
        Err(e) => {
            let detail = match e {
                FilebotError::DownstreamUnavailable(detail) => detail,
                other => other.to_string(),
            };
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "Failed to execute command", "details": detail })),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Free-text invocation
// ---------------------------------------------------------------------------

async fn nl_command(State(state): State<AppState>, body: Bytes) -> Response {
    let body = match parse_body(&body, example_free_text()) {
        Ok(b) => b,
        Err(resp) => return resp,
    };
    let text = body.get("command").and_then(Value::as_str).unwrap_or_default();

    let outcome = match state.orchestrator.handle_natural_language(text).await {
        Ok(outcome) => outcome,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": e.to_string(),
                    "example": example_free_text(),
                })),
            )
                .into_response();
        }
    };

    let original = text.trim();
    match outcome {
        OrchestratedResult::Dispatched {
            converted_command,
            result,
        } => Json(json!({
            "success": true,
            "originalCommand": original,
            "convertedCommand": converted_command,
            "result": result.text(),
            "isError": result.is_error,
        }))
        .into_response(),
        OrchestratedResult::Unclear {
            original_text,
            message,
        } => stage_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "unclear",
            &message,
            json!({ "originalCommand": original_text }),
        ),
        OrchestratedResult::TranslationFailed(TranslationFailure::Parse { raw_text, detail }) => {
            stage_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "translation",
                "Failed to parse the model reply",
                json!({ "originalCommand": original, "rawText": raw_text, "parseError": detail }),
            )
        }
        OrchestratedResult::TranslationFailed(TranslationFailure::Backend { detail }) => stage_error(
            StatusCode::BAD_GATEWAY,
            "translation",
            "Model backend unavailable",
            json!({ "originalCommand": original, "details": detail }),
        ),
        OrchestratedResult::DispatchRejected {
            converted_command,
            message,
        } => stage_error(
            StatusCode::BAD_REQUEST,
            "dispatch",
            &message,
            json!({ "originalCommand": original, "convertedCommand": converted_command }),
        ),
        OrchestratedResult::DownstreamUnavailable {
            converted_command,
            detail,
        } => stage_error(
            StatusCode::BAD_GATEWAY,
            "downstream",
            "Dispatcher unavailable",
            json!({ "originalCommand": original, "convertedCommand": converted_command, "details": detail }),
        ),
    }
}

fn stage_error(status: StatusCode, stage: &str, error: &str, extra: Value) -> Response {
    let mut body = json!({ "success": false, "stage": stage, "error": error });
    if let (Value::Object(map), Value::Object(extra)) = (&mut body, extra) {
        map.extend(extra);
    }
    (status, Json(body)).into_response()
}

// ---------------------------------------------------------------------------
// Listings and liveness
// ---------------------------------------------------------------------------

async fn api_tools(State(state): State<AppState>) -> Json<Value> {
    let tools: Vec<_> = state.dispatcher.catalog().collect();
    Json(json!({ "tools": tools, "example": example_command() }))
}

async fn allowed_directories(State(state): State<AppState>) -> Json<Value> {
    let root = state.dispatcher.guard().root().display().to_string();
    Json(json!({ "allowedDirectories": [root] }))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "server": "filebot",
        "version": env!("CARGO_PKG_VERSION"),
        "allowedDirectory": state.dispatcher.guard().root().display().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": chrono::Utc::now().to_rfc3339() }))
}
