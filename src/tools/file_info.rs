//! `get_file_info` — type, size, and timestamps of a path.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ArgType, ArgumentSpec, ToolCatalogEntry, ToolOutcome};
use crate::sandbox::PathGuard;

pub const ENTRY: ToolCatalogEntry = ToolCatalogEntry {
    name: "get_file_info",
    description: "Show whether a path is a file or directory, its size, and its timestamps",
    arguments: &[ArgumentSpec {
        name: "path",
        arg_type: ArgType::String,
        required: true,
        default: None,
        description: "File or directory to inspect, relative to the allowed directory",
    }],
};

#[derive(Debug, Deserialize)]
struct FileInfoParams {
    path: String,
}

pub fn execute(guard: &PathGuard, arguments: serde_json::Value) -> ToolOutcome {
    let params: FileInfoParams = match super::parse_params(ENTRY.name, arguments) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };

    // Sandbox check comes before any stat call.
    let target = match guard.resolve(&params.path) {
        Ok(p) => p,
        Err(e) => return ToolOutcome::from_error(&e),
    };

    let metadata = match std::fs::metadata(&target) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ToolOutcome::Err(format!("File does not exist: {}", params.path));
        }
        Err(e) => return ToolOutcome::Err(format!("Error getting file info: {e}")),
    };

    let lines = [
        format!("isDirectory: {}", metadata.is_dir()),
        format!("isFile: {}", metadata.is_file()),
        format!("size: {}", metadata.len()),
        format!("created: {}", format_time(metadata.created())),
        format!("modified: {}", format_time(metadata.modified())),
        format!("accessed: {}", format_time(metadata.accessed())),
    ];

    ToolOutcome::Ok(lines.join("\n"))
}

/// RFC 3339 in UTC, or `unavailable` when the platform does not record it.
fn format_time(time: std::io::Result<SystemTime>) -> String {
    time.map_or_else(
        |_| "unavailable".to_owned(),
        |t| DateTime::<Utc>::from(t).to_rfc3339(),
    )
}
