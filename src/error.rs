//! Error types for the filebot crate.

use std::path::PathBuf;

/// Filebot-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum FilebotError {
    /// Path resolves outside the allowed root.
    #[error("Access denied - path outside allowed directory: {path}")]
    SandboxViolation { path: String },

    /// Tool name does not match any catalog entry.
    #[error("Unknown tool: {name}. Available tools: {}", .available.join(", "))]
    UnknownTool { name: String, available: Vec<String> },

    /// A required argument is absent or empty.
    #[error("missing required argument '{argument}' for {tool}")]
    MissingArgument { tool: String, argument: String },

    /// An argument has the wrong shape (e.g. a number where a string is expected).
    #[error("invalid argument '{argument}' for {tool}: {reason}")]
    InvalidArgument {
        tool: String,
        argument: String,
        reason: String,
    },

    /// Free-text or structured command was empty.
    #[error("command is required")]
    EmptyCommand,

    /// I/O error with context.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model backend unreachable or returned an unusable reply.
    #[error("model backend error: {0}")]
    Backend(String),

    /// Remote dispatcher unreachable, timed out, or answered with garbage.
    #[error("dispatcher unavailable: {0}")]
    DownstreamUnavailable(String),

    /// Remote dispatcher answered with a JSON-RPC error object.
    #[error("dispatcher rejected command ({code}): {message}")]
    DownstreamRejected { code: i64, message: String },

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FilebotError {
    /// True for errors caused by the caller's input rather than by execution.
    ///
    /// A remote dispatcher's `-32602` rejection counts: it is the same caller
    /// error raised one hop away.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool { .. }
                | Self::MissingArgument { .. }
                | Self::InvalidArgument { .. }
                | Self::EmptyCommand
                | Self::DownstreamRejected {
                    code: crate::server::INVALID_PARAMS,
                    ..
                }
        )
    }
}

/// Convenience result type for filebot operations.
pub type FilebotResult<T> = Result<T, FilebotError>;
