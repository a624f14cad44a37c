//! `read_file` — return a file's full contents as UTF-8 text.

use serde::Deserialize;

use super::{ArgType, ArgumentSpec, ToolCatalogEntry, ToolOutcome};
use crate::sandbox::PathGuard;

pub const ENTRY: ToolCatalogEntry = ToolCatalogEntry {
    name: "read_file",
    description: "Read the full contents of a text file",
    arguments: &[ArgumentSpec {
        name: "path",
        arg_type: ArgType::String,
        required: true,
        default: None,
        description: "File to read, relative to the allowed directory",
    }],
};

#[derive(Debug, Deserialize)]
struct ReadFileParams {
    path: String,
}

pub fn execute(guard: &PathGuard, arguments: serde_json::Value) -> ToolOutcome {
    let params: ReadFileParams = match super::parse_params(ENTRY.name, arguments) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };

    let file_path = match guard.resolve(&params.path) {
        Ok(p) => p,
        Err(e) => return ToolOutcome::from_error(&e),
    };

    match std::fs::read_to_string(&file_path) {
        Ok(content) => ToolOutcome::Ok(content),
        Err(e) => ToolOutcome::Err(format!("Error reading file: {}: {e}", params.path)),
    }
}
