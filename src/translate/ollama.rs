//! Ollama-style model backend: `POST {url}/api/generate`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ModelBackend;
use crate::config::FilebotConfig;
use crate::error::{FilebotError, FilebotResult};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP client for a `/api/generate` completion endpoint.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: impl Into<String>, timeout: Duration) -> FilebotResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FilebotError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            model: model.into(),
            timeout,
        })
    }

    pub fn from_config(config: &FilebotConfig) -> FilebotResult<Self> {
        Self::new(&config.backend_url, config.model.clone(), config.backend_timeout)
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> FilebotResult<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        debug!(endpoint = self.endpoint.as_str(), model = self.model.as_str(), "model request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| FilebotError::Backend(describe_transport_error(&e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FilebotError::Backend(format!(
                "{} returned {status}: {body}",
                self.endpoint
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| FilebotError::Backend(format!("unexpected reply from {}: {e}", self.endpoint)))?;
        Ok(body.response)
    }
}

/// Human-readable description of a failed outbound request.
pub(crate) fn describe_transport_error(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("request timed out after {}ms", timeout.as_millis())
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
