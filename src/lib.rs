//! `filebot` — natural-language file commands over a sandboxed tool dispatcher.
//!
//! A caller either sends a structured tool invocation or a free-text
//! instruction. Free text is translated into a structured command by a
//! language model, then executed by a dispatcher that only ever touches
//! files inside one allowed root.
//!
//! # Tools
//!
//! - `list_directory` — `[DIR] name` / `[FILE] name` listing
//! - `read_file` — full UTF-8 contents
//! - `write_file` — atomic create-or-replace
//! - `get_file_info` — type, size, timestamps
//! - `list_allowed_directories` — the sandbox root
//!
//! # Architecture
//!
//! ```text
//! free text → Translator ──(model backend)──→ StructuredCommand
//!                                                   ↓
//! structured command ─────────────────────→ Dispatcher (local or remote)
//!                                                   ↓
//!                                           PathGuard → tool handler
//!                                                   ↓
//! caller ←──────────────────────────────────── ToolCallResult
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod remote;
pub mod sandbox;
pub mod server;
pub mod tools;
pub mod translate;
pub mod util;

pub use config::FilebotConfig;
pub use dispatch::{Dispatcher, StructuredCommand};
pub use error::{FilebotError, FilebotResult};
pub use orchestrator::{DispatchTarget, OrchestratedResult, Orchestrator};
pub use sandbox::PathGuard;
pub use translate::{TranslationOutcome, Translator};
