//! Tool dispatcher — validates a structured command and routes it to its handler.
//!
//! Validation happens in two layers. [`StructuredCommand::from_loose`] turns
//! loosely typed wire input into a typed command. [`Dispatcher::try_dispatch`]
//! then checks the tool name against the catalog and every required argument
//! before the handler runs, so a rejected command never touches the
//! filesystem.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{FilebotError, FilebotResult};
use crate::sandbox::PathGuard;
use crate::tools::{self, ArgType, Tool, ToolCallResult, ToolCatalogEntry, ToolOutcome};

/// Tool name the translator emits when no tool fits the request.
pub const UNCLEAR_TOOL: &str = "unclear";

/// A tool invocation: `{tool_code, arguments}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCommand {
    #[serde(rename = "tool_code")]
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl StructuredCommand {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Build a command from untyped wire fields.
    ///
    /// The tool name must be a non-empty string. Missing or `null` arguments
    /// become an empty mapping; anything other than an object is rejected.
    pub fn from_loose(tool: Option<&Value>, arguments: Option<&Value>) -> FilebotResult<Self> {
        let tool_name = match tool {
            Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_owned(),
            _ => return Err(FilebotError::EmptyCommand),
        };

        let arguments = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(FilebotError::InvalidArgument {
                    tool: tool_name,
                    argument: "arguments".to_owned(),
                    reason: format!("expected an object, got {}", json_type(other)),
                });
            }
        };

        Ok(Self {
            tool_name,
            arguments,
        })
    }
}

/// Routes structured commands to the tool catalog.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    guard: PathGuard,
    tools: Vec<Tool>,
}

impl Dispatcher {
    /// Dispatcher over the base catalog.
    pub fn new(guard: PathGuard) -> Self {
        Self {
            guard,
            tools: tools::catalog().to_vec(),
        }
    }

    #[cfg(test)]
    pub(crate) const fn with_tools(guard: PathGuard, tools: Vec<Tool>) -> Self {
        Self { guard, tools }
    }

    pub const fn guard(&self) -> &PathGuard {
        &self.guard
    }

    pub fn catalog(&self) -> impl Iterator<Item = &ToolCatalogEntry> {
        self.tools.iter().map(|tool| &tool.entry)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.catalog().map(|entry| entry.name.to_owned()).collect()
    }

    /// Dispatch, folding caller errors into the uniform error envelope.
    pub fn dispatch(&self, command: &StructuredCommand) -> ToolCallResult {
        match self.try_dispatch(command) {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                warn!(tool = command.tool_name, error = %e, "command rejected");
                ToolOutcome::from_error(&e).into()
            }
        }
    }

    /// Dispatch, keeping caller errors separate from handler outcomes.
    ///
    /// `Err` is always a caller error (unknown tool, missing or malformed
    /// argument); handler failures come back as `Ok(ToolOutcome::Err(..))`.
    pub fn try_dispatch(&self, command: &StructuredCommand) -> FilebotResult<ToolOutcome> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.entry.name == command.tool_name)
            .ok_or_else(|| FilebotError::UnknownTool {
                name: command.tool_name.clone(),
                available: self.tool_names(),
            })?;

        let arguments = prepare_arguments(&tool.entry, &command.arguments)?;

        debug!(tool = tool.entry.name, "dispatching tool call");
        let outcome = (tool.handler)(&self.guard, Value::Object(arguments));
        if outcome.is_error() {
            debug!(tool = tool.entry.name, error = outcome.text(), "tool returned error");
        }
        Ok(outcome)
    }
}

/// Check required arguments, apply defaults, and type-check known arguments.
fn prepare_arguments(
    entry: &ToolCatalogEntry,
    given: &Map<String, Value>,
) -> FilebotResult<Map<String, Value>> {
    let mut arguments = given.clone();

    for spec in entry.arguments {
        let present = match given.get(spec.name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(other) => match spec.arg_type {
                ArgType::String => {
                    return Err(FilebotError::InvalidArgument {
                        tool: entry.name.to_owned(),
                        argument: spec.name.to_owned(),
                        reason: format!("expected a string, got {}", json_type(other)),
                    });
                }
            },
        };

        if present {
            continue;
        }
        if spec.required {
            return Err(FilebotError::MissingArgument {
                tool: entry.name.to_owned(),
                argument: spec.name.to_owned(),
            });
        }
        match spec.default {
            Some(default) => {
                arguments.insert(spec.name.to_owned(), Value::from(default));
            }
            None => {
                arguments.remove(spec.name);
            }
        }
    }

    Ok(arguments)
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::tools::read_file;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn dispatcher() -> (tempfile::TempDir, Dispatcher) {
        let dir = tempfile::tempdir().expect("tempdir");
        let guard = PathGuard::new(dir.path()).expect("guard");
        (dir, Dispatcher::new(guard))
    }

    #[test]
    fn test_unknown_tool_enumerates_catalog() {
        let (_dir, dispatcher) = dispatcher();
        let command = StructuredCommand::new("not_a_real_tool", Map::new());

        let result = dispatcher.dispatch(&command);
        assert!(result.is_error);
        let text = result.text();
        assert!(text.contains("Unknown tool: not_a_real_tool"));
        for name in [
            "list_directory",
            "read_file",
            "write_file",
            "get_file_info",
            "list_allowed_directories",
        ] {
            assert!(text.contains(name), "missing {name} in {text}");
        }
    }

    #[test]
    fn test_unclear_sentinel_is_unknown() {
        let (_dir, dispatcher) = dispatcher();
        let err = dispatcher
            .try_dispatch(&StructuredCommand::new(UNCLEAR_TOOL, Map::new()))
            .expect_err("unclear is not a tool");
        assert!(matches!(err, FilebotError::UnknownTool { .. }));
    }

    static HANDLER_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn counting_handler(_guard: &PathGuard, _arguments: Value) -> ToolOutcome {
        HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
        ToolOutcome::Ok("ran".to_owned())
    }

    #[test]
    fn test_missing_required_argument_skips_handler() {
        let dir = tempfile::tempdir().expect("tempdir");
        let guard = PathGuard::new(dir.path()).expect("guard");
        let dispatcher = Dispatcher::with_tools(
            guard,
            vec![Tool {
                entry: read_file::ENTRY,
                handler: counting_handler,
            }],
        );

        let err = dispatcher
            .try_dispatch(&StructuredCommand::new("read_file", Map::new()))
            .expect_err("path is required");
        assert!(matches!(
            err,
            FilebotError::MissingArgument { ref argument, .. } if argument == "path"
        ));

        let err = dispatcher
            .try_dispatch(&StructuredCommand::new("read_file", args(json!({"path": ""}))))
            .expect_err("empty path is missing");
        assert!(err.is_caller_error());
        assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 0);

        let outcome = dispatcher
            .try_dispatch(&StructuredCommand::new("read_file", args(json!({"path": "x"}))))
            .expect("valid");
        assert_eq!(outcome.text(), "ran");
        assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_write_file_requires_both_arguments() {
        let (dir, dispatcher) = dispatcher();
        let result = dispatcher.dispatch(&StructuredCommand::new(
            "write_file",
            args(json!({"path": "out.txt"})),
        ));
        assert!(result.is_error);
        assert!(result.text().contains("content"));
        assert!(!dir.path().join("out.txt").exists());
    }

    #[test]
    fn test_non_string_argument_rejected() {
        let (_dir, dispatcher) = dispatcher();
        let err = dispatcher
            .try_dispatch(&StructuredCommand::new("read_file", args(json!({"path": 3}))))
            .expect_err("number path");
        assert!(matches!(err, FilebotError::InvalidArgument { .. }));
    }

    #[test]
    fn test_default_path_applied() {
        let (dir, dispatcher) = dispatcher();
        std::fs::write(dir.path().join("only.txt"), "").expect("write");

        let result = dispatcher.dispatch(&StructuredCommand::new("list_directory", Map::new()));
        assert!(!result.is_error);
        assert_eq!(result.text(), "[FILE] only.txt");
    }

    #[test]
    fn test_handler_error_propagates_unchanged() {
        let (_dir, dispatcher) = dispatcher();
        let outcome = dispatcher
            .try_dispatch(&StructuredCommand::new(
                "read_file",
                args(json!({"path": "missing.txt"})),
            ))
            .expect("handler errors are not caller errors");
        assert!(outcome.is_error());
    }

    #[test]
    fn test_from_loose() {
        let cmd = StructuredCommand::from_loose(Some(&json!("read_file")), None).expect("ok");
        assert_eq!(cmd.tool_name, "read_file");
        assert!(cmd.arguments.is_empty());

        let err = StructuredCommand::from_loose(Some(&json!("  ")), None).expect_err("blank");
        assert!(matches!(err, FilebotError::EmptyCommand));

        let err = StructuredCommand::from_loose(None, None).expect_err("absent");
        assert!(matches!(err, FilebotError::EmptyCommand));

        let err = StructuredCommand::from_loose(Some(&json!("read_file")), Some(&json!([1])))
            .expect_err("array args");
        assert!(matches!(err, FilebotError::InvalidArgument { .. }));
    }

    #[test]
    fn test_command_wire_shape() {
        let cmd: StructuredCommand =
            serde_json::from_value(json!({"tool_code": "list_directory"})).expect("parse");
        assert!(cmd.arguments.is_empty());
        let back = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(back, json!({"tool_code": "list_directory", "arguments": {}}));
    }
}
