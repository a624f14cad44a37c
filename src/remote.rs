//! Client for a separately deployed dispatcher (`POST {url}/mcp-filesystem`).

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::FilebotConfig;
use crate::dispatch::StructuredCommand;
use crate::error::{FilebotError, FilebotResult};
use crate::server::{CallToolEnvelope, JsonRpcResponse};
use crate::tools::ToolCallResult;
use crate::translate::ollama::describe_transport_error;

/// Forwards structured commands to a remote dispatcher.
///
/// Every call is bounded by the configured timeout and never retried.
/// Transport failures, timeouts, and undecodable replies surface as
/// [`FilebotError::DownstreamUnavailable`]; a JSON-RPC error object from the
/// dispatcher surfaces as [`FilebotError::DownstreamRejected`].
#[derive(Debug, Clone)]
pub struct RemoteDispatcher {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteDispatcher {
    pub fn new(base_url: &str, timeout: Duration) -> FilebotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| FilebotError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/mcp-filesystem", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// `None` when no dispatcher URL is configured.
    pub fn from_config(config: &FilebotConfig) -> FilebotResult<Option<Self>> {
        config
            .dispatcher_url
            .as_deref()
            .map(|url| Self::new(url, config.dispatcher_timeout))
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call(&self, command: &StructuredCommand) -> FilebotResult<ToolCallResult> {
        let envelope = CallToolEnvelope::new(command);
        debug!(endpoint = self.endpoint.as_str(), tool = command.tool_name, "forwarding command");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                let detail = describe_transport_error(&e, self.timeout);
                warn!(endpoint = self.endpoint.as_str(), detail = detail.as_str(), "dispatcher unreachable");
                FilebotError::DownstreamUnavailable(format!("{}: {detail}", self.endpoint))
            })?;

        let status = response.status();
        let body: JsonRpcResponse = response.json().await.map_err(|e| {
            FilebotError::DownstreamUnavailable(format!(
                "{} returned {status} with an undecodable body: {}",
                self.endpoint,
                describe_transport_error(&e, self.timeout)
            ))
        })?;

        if let Some(err) = body.error {
            return Err(FilebotError::DownstreamRejected {
                code: err.code,
                message: err.message,
            });
        }

        let result = body.result.ok_or_else(|| {
            FilebotError::DownstreamUnavailable(format!(
                "{} returned {status} without result or error",
                self.endpoint
            ))
        })?;

        serde_json::from_value(result).map_err(|e| {
            FilebotError::DownstreamUnavailable(format!(
                "{} returned a malformed tool result: {e}",
                self.endpoint
            ))
        })
    }
}
