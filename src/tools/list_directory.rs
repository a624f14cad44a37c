//! `list_directory` — enumerate the direct children of a directory.

use serde::Deserialize;

use super::{ArgType, ArgumentSpec, ToolCatalogEntry, ToolOutcome};
use crate::sandbox::PathGuard;

pub const ENTRY: ToolCatalogEntry = ToolCatalogEntry {
    name: "list_directory",
    description: "List the files and subdirectories of a directory",
    arguments: &[ArgumentSpec {
        name: "path",
        arg_type: ArgType::String,
        required: false,
        default: Some("."),
        description: "Directory to list, relative to the allowed directory",
    }],
};

/// Text returned for a directory with no entries.
pub const EMPTY_LISTING: &str = "Directory is empty";

#[derive(Debug, Deserialize)]
struct ListDirectoryParams {
    #[serde(default = "default_path")]
    path: String,
}

fn default_path() -> String {
    ".".to_owned()
}

pub fn execute(guard: &PathGuard, arguments: serde_json::Value) -> ToolOutcome {
    let params: ListDirectoryParams = match super::parse_params(ENTRY.name, arguments) {
        Ok(p) => p,
        Err(outcome) => return outcome,
    };

    let dir = match guard.resolve(&params.path) {
        Ok(p) => p,
        Err(e) => return ToolOutcome::from_error(&e),
    };

    let read_dir = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => return ToolOutcome::Err(format!("Error reading directory: {e}")),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => return ToolOutcome::Err(format!("Error reading directory: {e}")),
        };
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    entries.sort();

    if entries.is_empty() {
        return ToolOutcome::Ok(EMPTY_LISTING.to_owned());
    }

    let listing = entries
        .iter()
        .map(|(name, is_dir)| {
            let tag = if *is_dir { "[DIR]" } else { "[FILE]" };
            format!("{tag} {name}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    ToolOutcome::Ok(listing)
}
