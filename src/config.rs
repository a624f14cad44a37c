//! Process-wide configuration, built once at startup.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FilebotError, FilebotResult};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DISPATCHER_TIMEOUT_SECS: u64 = 10;

/// Immutable configuration shared by every component.
#[derive(Debug, Clone)]
pub struct FilebotConfig {
    /// Sandbox root. Every tool operation must stay inside it.
    pub allowed_root: PathBuf,
    /// HTTP listen port.
    pub port: u16,
    /// Base URL of the model backend (`{url}/api/generate`).
    pub backend_url: String,
    /// Model name sent with each completion request.
    pub model: String,
    /// Base URL of a remote dispatcher. `None` dispatches in-process.
    pub dispatcher_url: Option<String>,
    pub backend_timeout: Duration,
    pub dispatcher_timeout: Duration,
}

impl FilebotConfig {
    /// Build a configuration with defaults rooted at `allowed_root`.
    pub fn new(allowed_root: PathBuf) -> Self {
        Self {
            allowed_root,
            port: DEFAULT_PORT,
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            dispatcher_url: None,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            dispatcher_timeout: Duration::from_secs(DEFAULT_DISPATCHER_TIMEOUT_SECS),
        }
    }

    /// Read the configuration from process environment variables.
    pub fn from_env(allowed_root: PathBuf) -> FilebotResult<Self> {
        Self::from_lookup(allowed_root, |key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(
        allowed_root: PathBuf,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> FilebotResult<Self> {
        let mut config = Self::new(allowed_root);

        if let Some(port) = lookup("PORT") {
            config.port = parse_number("PORT", &port)?;
        }
        if let Some(url) = non_empty(lookup("OLLAMA_URL")) {
            config.backend_url = url.trim_end_matches('/').to_owned();
        }
        if let Some(model) = non_empty(lookup("OLLAMA_MODEL")) {
            config.model = model;
        }
        config.dispatcher_url =
            non_empty(lookup("DISPATCHER_URL")).map(|url| url.trim_end_matches('/').to_owned());
        if let Some(secs) = lookup("FILEBOT_BACKEND_TIMEOUT_SECS") {
            config.backend_timeout =
                Duration::from_secs(parse_number("FILEBOT_BACKEND_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("FILEBOT_DISPATCHER_TIMEOUT_SECS") {
            config.dispatcher_timeout =
                Duration::from_secs(parse_number("FILEBOT_DISPATCHER_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> FilebotResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| FilebotError::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}
