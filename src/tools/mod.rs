//! Tool catalog and result envelopes.
//!
//! The catalog is the single source of truth for tool names, descriptions,
//! and argument specs: the dispatcher validates against it, the translator
//! embeds it in its prompt, and the HTTP/MCP surfaces list it. Each tool
//! pairs a [`ToolCatalogEntry`] with a handler that maps
//! `(guard, arguments)` to a [`ToolOutcome`] and never fails past its own
//! boundary.

pub mod allowed_directories;
pub mod file_info;
pub mod list_directory;
pub mod read_file;
pub mod write_file;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FilebotError;
use crate::sandbox::PathGuard;

// ---------------------------------------------------------------------------
// Result envelopes
// ---------------------------------------------------------------------------

/// Internal tool result: success text or error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Ok(String),
    Err(String),
}

impl ToolOutcome {
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Ok(text) | Self::Err(text) => text,
        }
    }

    /// Error outcome carrying an error's display text.
    pub fn from_error(err: &FilebotError) -> Self {
        Self::Err(format!("Error: {err}"))
    }
}

/// Content item in the external tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_owned(),
            text: text.into(),
        }
    }
}

/// External tool result: `{content: [{type, text}], isError}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Concatenated text of all content items.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|item| item.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<ToolOutcome> for ToolCallResult {
    fn from(outcome: ToolOutcome) -> Self {
        let is_error = outcome.is_error();
        let text = match outcome {
            ToolOutcome::Ok(text) | ToolOutcome::Err(text) => text,
        };
        Self {
            content: vec![ContentItem::text(text)],
            is_error,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Argument value type. All current tools take string arguments only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
}

impl ArgType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
        }
    }
}

/// One argument in a tool's signature.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArgumentSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub description: &'static str,
}

/// Static description of one tool.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolCatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [ArgumentSpec],
}

impl ToolCatalogEntry {
    /// JSON Schema for the tool's arguments, as MCP `tools/list` expects.
    pub fn input_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .arguments
            .iter()
            .map(|arg| {
                let mut prop = serde_json::json!({
                    "type": arg.arg_type.as_str(),
                    "description": arg.description,
                });
                if let Some(default) = arg.default {
                    prop["default"] = serde_json::Value::from(default);
                }
                (arg.name.to_owned(), prop)
            })
            .collect();
        let required: Vec<&str> = self
            .arguments
            .iter()
            .filter(|arg| arg.required)
            .map(|arg| arg.name)
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool handler: total function from arguments to an outcome.
pub type Handler = fn(&PathGuard, serde_json::Value) -> ToolOutcome;

/// A catalog entry bound to its handler.
#[derive(Debug, Clone, Copy)]
pub struct Tool {
    pub entry: ToolCatalogEntry,
    pub handler: Handler,
}

static CATALOG: [Tool; 5] = [
    Tool {
        entry: list_directory::ENTRY,
        handler: list_directory::execute,
    },
    Tool {
        entry: read_file::ENTRY,
        handler: read_file::execute,
    },
    Tool {
        entry: write_file::ENTRY,
        handler: write_file::execute,
    },
    Tool {
        entry: file_info::ENTRY,
        handler: file_info::execute,
    },
    Tool {
        entry: allowed_directories::ENTRY,
        handler: allowed_directories::execute,
    },
];

/// The base tool catalog, in listing order.
pub fn catalog() -> &'static [Tool] {
    &CATALOG
}

/// Deserialize handler parameters, turning a shape error into an error outcome.
fn parse_params<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, ToolOutcome> {
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolOutcome::Err(format!("Error: invalid {tool} arguments: {e}")))
}
