//! Command translator — turns free text into a [`StructuredCommand`] with a
//! language model.
//!
//! One prompt embeds the tool catalog and asks for a single JSON object. The
//! raw reply is searched for the first brace-delimited span, which is parsed
//! and classified. Extraction is a best-effort heuristic, so
//! [`TranslationOutcome::ParseFailure`] is an ordinary outcome, not a fault.
//! The resulting command is not checked against the catalog here; that is
//! the dispatcher's job.

pub mod ollama;

use std::fmt::Write as _;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{StructuredCommand, UNCLEAR_TOOL};
use crate::error::FilebotResult;
use crate::tools::{self, ToolCatalogEntry};

pub use ollama::OllamaBackend;

/// Greedy: first `{` through last `}`.
static JSON_OBJECT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").ok());

const DEFAULT_UNCLEAR_MESSAGE: &str = "The request could not be mapped to a tool";

/// A language-model completion backend.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run one non-streaming completion and return the raw reply text.
    async fn generate(&self, prompt: &str) -> FilebotResult<String>;
}

/// Result of one translation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Success { command: StructuredCommand },
    /// The model declared that no tool fits.
    Unclear { message: String },
    /// The reply held no usable JSON object.
    ParseFailure { raw_text: String, detail: String },
    /// The backend could not be reached or answered with an error.
    BackendFailure { detail: String },
}

/// Prompts a [`ModelBackend`] and classifies its reply.
#[derive(Clone)]
pub struct Translator {
    backend: Arc<dyn ModelBackend>,
    catalog: Vec<ToolCatalogEntry>,
}

impl Translator {
    /// Translator over the base tool catalog.
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            catalog: tools::catalog().iter().map(|tool| tool.entry).collect(),
        }
    }

    pub fn prompt_for(&self, free_text: &str) -> String {
        build_prompt(&self.catalog, free_text)
    }

    pub async fn translate(&self, free_text: &str) -> TranslationOutcome {
        let prompt = self.prompt_for(free_text);
        debug!(request = free_text, "translating request");

        let raw = match self.backend.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "model backend failed");
                return TranslationOutcome::BackendFailure {
                    detail: e.to_string(),
                };
            }
        };

        let outcome = interpret_reply(&raw);
        if let TranslationOutcome::ParseFailure { detail, .. } = &outcome {
            warn!(detail = detail.as_str(), raw = raw.as_str(), "unparseable model reply");
        }
        outcome
    }
}

/// Compose the translation prompt for `free_text`.
pub fn build_prompt(catalog: &[ToolCatalogEntry], free_text: &str) -> String {
    let mut prompt = String::from(
        "You translate requests about files into tool calls for a filesystem service.\n\
         Files can only be accessed inside the allowed directory.\n\n\
         Available tools:\n",
    );

    for entry in catalog {
        let _ = writeln!(prompt, "- {}: {}", entry.name, entry.description);
        if entry.arguments.is_empty() {
            prompt.push_str("  arguments: none\n");
        }
        for arg in entry.arguments {
            let necessity = if arg.required { "required" } else { "optional" };
            let _ = write!(
                prompt,
                "  - {} ({}, {necessity}",
                arg.name,
                arg.arg_type.as_str()
            );
            if let Some(default) = arg.default {
                let _ = write!(prompt, ", default \"{default}\"");
            }
            let _ = writeln!(prompt, "): {}", arg.description);
        }
    }

    let _ = write!(
        prompt,
        "\nReply with exactly one JSON object and nothing else, shaped like:\n\
         {{\"tool_code\": \"<tool name>\", \"arguments\": {{ ... }}}}\n\
         If no tool fits the request, reply with:\n\
         {{\"tool_code\": \"{UNCLEAR_TOOL}\", \"message\": \"<why>\"}}\n\n\
         Request: {free_text}\n"
    );

    prompt
}

/// First brace-delimited span in `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT.as_ref()?.find(text).map(|m| m.as_str())
}

/// Classify a raw model reply.
pub fn interpret_reply(raw: &str) -> TranslationOutcome {
    let parse_failure = |detail: String| TranslationOutcome::ParseFailure {
        raw_text: raw.to_owned(),
        detail,
    };

    let Some(candidate) = extract_json_object(raw) else {
        return parse_failure("no JSON object found in model reply".to_owned());
    };

    let parsed: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => return parse_failure(format!("invalid JSON in model reply: {e}")),
    };

    let Some(tool_code) = parsed.get("tool_code").and_then(Value::as_str) else {
        return parse_failure("model reply has no string \"tool_code\" field".to_owned());
    };

    if tool_code == UNCLEAR_TOOL {
        let message = parsed
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_UNCLEAR_MESSAGE)
            .to_owned();
        return TranslationOutcome::Unclear { message };
    }

    let arguments = match parsed.get("arguments") {
        None | Some(Value::Null) => serde_json::Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return parse_failure("model reply \"arguments\" is not an object".to_owned());
        }
    };

    TranslationOutcome::Success {
        command: StructuredCommand::new(tool_code, arguments),
    }
}
