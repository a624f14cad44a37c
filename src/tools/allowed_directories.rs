//! `list_allowed_directories` — report the sandbox root.

use super::{ToolCatalogEntry, ToolOutcome};
use crate::sandbox::PathGuard;

pub const ENTRY: ToolCatalogEntry = ToolCatalogEntry {
    name: "list_allowed_directories",
    description: "Show the directory that file operations are restricted to",
    arguments: &[],
};

pub fn execute(guard: &PathGuard, _arguments: serde_json::Value) -> ToolOutcome {
    ToolOutcome::Ok(format!("Allowed directory: {}", guard.root().display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let guard = PathGuard::new(dir.path()).expect("guard");

        let outcome = execute(&guard, serde_json::Value::Null);
        assert!(!outcome.is_error());
        assert_eq!(
            outcome.text(),
            format!("Allowed directory: {}", guard.root().display())
        );
    }
}
