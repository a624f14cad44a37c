//! Orchestrator — free text in, tool result out.
//!
//! Translation and dispatch failures are folded into [`OrchestratedResult`]
//! variants so the caller can tell which stage failed and why.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dispatch::{Dispatcher, StructuredCommand};
use crate::error::{FilebotError, FilebotResult};
use crate::remote::RemoteDispatcher;
use crate::tools::ToolCallResult;
use crate::translate::{TranslationOutcome, Translator};

/// Where translated commands are executed.
#[derive(Debug, Clone)]
pub enum DispatchTarget {
    /// Same-process dispatcher.
    Local(Arc<Dispatcher>),
    /// Separately deployed dispatcher reached over HTTP.
    Remote(RemoteDispatcher),
}

impl DispatchTarget {
    /// Execute one command.
    ///
    /// Errors for which [`FilebotError::is_caller_error`] holds mean the
    /// command itself was refused; anything else means the dispatcher could
    /// not run it.
    pub async fn forward(&self, command: &StructuredCommand) -> FilebotResult<ToolCallResult> {
        match self {
            Self::Local(dispatcher) => dispatcher.try_dispatch(command).map(ToolCallResult::from),
            Self::Remote(remote) => remote.call(command).await,
        }
    }
}

/// Why translation produced no command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationFailure {
    /// The model replied, but not with a usable JSON object.
    Parse { raw_text: String, detail: String },
    /// The model backend could not be reached.
    Backend { detail: String },
}

/// Final result of a free-text request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratedResult {
    TranslationFailed(TranslationFailure),
    Unclear {
        original_text: String,
        message: String,
    },
    Dispatched {
        converted_command: StructuredCommand,
        result: ToolCallResult,
    },
    /// The dispatcher refused the translated command (unknown tool, bad arguments).
    DispatchRejected {
        converted_command: StructuredCommand,
        message: String,
    },
    /// The remote dispatcher was unreachable, timed out, or failed internally.
    DownstreamUnavailable {
        converted_command: StructuredCommand,
        detail: String,
    },
}

/// Runs translate-then-dispatch for free-text requests.
#[derive(Clone)]
pub struct Orchestrator {
    translator: Translator,
    target: DispatchTarget,
}

impl Orchestrator {
    pub const fn new(translator: Translator, target: DispatchTarget) -> Self {
        Self { translator, target }
    }

    pub const fn target(&self) -> &DispatchTarget {
        &self.target
    }

    /// Translate `free_text` and dispatch the resulting command.
    ///
    /// The only `Err` is [`FilebotError::EmptyCommand`]; every other failure
    /// is an [`OrchestratedResult`] variant.
    pub async fn handle_natural_language(&self, free_text: &str) -> FilebotResult<OrchestratedResult> {
        let free_text = free_text.trim();
        if free_text.is_empty() {
            return Err(FilebotError::EmptyCommand);
        }

        let command = match self.translator.translate(free_text).await {
            TranslationOutcome::Success { command } => command,
            TranslationOutcome::Unclear { message } => {
                info!(request = free_text, message = message.as_str(), "request unclear");
                return Ok(OrchestratedResult::Unclear {
                    original_text: free_text.to_owned(),
                    message,
                });
            }
            TranslationOutcome::ParseFailure { raw_text, detail } => {
                return Ok(OrchestratedResult::TranslationFailed(TranslationFailure::Parse {
                    raw_text,
                    detail,
                }));
            }
            TranslationOutcome::BackendFailure { detail } => {
                return Ok(OrchestratedResult::TranslationFailed(
                    TranslationFailure::Backend { detail },
                ));
            }
        };

        info!(request = free_text, tool = command.tool_name, "request translated");

        let result = match self.target.forward(&command).await {
            Ok(result) => OrchestratedResult::Dispatched {
                converted_command: command,
                result,
            },
            Err(e) if e.is_caller_error() => {
                warn!(tool = command.tool_name, error = %e, "translated command rejected");
                OrchestratedResult::DispatchRejected {
                    converted_command: command,
                    message: e.to_string(),
                }
            }
            Err(e) => {
                let detail = match e {
                    FilebotError::DownstreamUnavailable(detail) => detail,
                    other => other.to_string(),
                };
                warn!(tool = command.tool_name, detail = detail.as_str(), "dispatcher unavailable");
                OrchestratedResult::DownstreamUnavailable {
                    converted_command: command,
                    detail,
                }
            }
        };
        Ok(result)
    }
}
