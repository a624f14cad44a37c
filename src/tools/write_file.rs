//! `write_file` — create or overwrite a file with the given content.

use serde::Deserialize;

use super::{ArgType, ArgumentSpec, ToolCatalogEntry, ToolOutcome};
use crate::sandbox::PathGuard;

pub const ENTRY: ToolCatalogEntry = ToolCatalogEntry {
    name: "write_file",
    description: "Write text to a file, creating it or replacing its contents",
    arguments: &[
        ArgumentSpec {
            name: "path",
            arg_type: ArgType::String,
            required: true,
            default: None,
            description: "File to write, relative to the allowed directory",
        },
        ArgumentSpec {
            name: "content",
            arg_type: ArgType::String,
            required: true,
            default: None,
            description: "Text to write",
        },
    ],
};

#[derive(Debug, Deserialize)]
struct WriteFileParams {
    path: String,
    content: String,
}

pub fn execute(guard: &PathGuard, arguments: serde_json::Value) -> ToolOutcome {
    let params: WriteFileParams = match super::parse_params(ENTRY.name, arguments) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };

    let file_path = match guard.resolve(&params.path) {
        Ok(p) => p,
        Err(e) => return ToolOutcome::from_error(&e),
    };

    match crate::util::atomic::atomic_write(&file_path, &params.content) {
        Ok(()) => ToolOutcome::Ok(format!("Successfully wrote to file: {}", params.path)),
        Err(e) => ToolOutcome::Err(format!("Error writing file: {e}")),
    }
}
