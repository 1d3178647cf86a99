//! Tool registry and executor for the review agent.
//!
//! The tool set is closed: [`Tool`] has one variant per callable tool, and
//! [`ToolExecutor`] dispatches on it. Tool failures never abort a review;
//! they become tool-result text the model can react to.

use crate::agent::error::ToolError;
use crate::analysis::run_linter;
use crate::config::ToolsConfig;
use crate::models::{FunctionDefinition, ToolCall, ToolDefinition};
use crate::repo::get_git_diff;
use crate::repo::diff::DEFAULT_TARGET;
use crate::scanner::{FileScanner, ScanConfig};
use serde_json::{json, Map, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Every tool the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GetWorkingDirectory,
    ReadFile,
    ReadMultipleFiles,
    ListFiles,
    SearchInFiles,
    AnalyzeDirectory,
    GetGitDiff,
    RunLinter,
}

impl Tool {
    pub const ALL: [Tool; 8] = [
        Tool::GetWorkingDirectory,
        Tool::ReadFile,
        Tool::ReadMultipleFiles,
        Tool::ListFiles,
        Tool::SearchInFiles,
        Tool::GetGitDiff,
        Tool::RunLinter,
        Tool::AnalyzeDirectory,
    ];

    /// Name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Tool::GetWorkingDirectory => "get_working_directory",
            Tool::ReadFile => "read_file",
            Tool::ReadMultipleFiles => "read_multiple_files",
            Tool::ListFiles => "list_files",
            Tool::SearchInFiles => "search_in_files",
            Tool::AnalyzeDirectory => "analyze_directory",
            Tool::GetGitDiff => "get_git_diff",
            Tool::RunLinter => "run_linter",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Declaration sent to the model.
    pub fn definition(self) -> ToolDefinition {
        let (description, parameters) = match self {
            Tool::GetWorkingDirectory => (
                "Get the current working directory, useful for resolving file paths.",
                json!({
                    "type": "object",
                    "properties": {}
                }),
            ),
            Tool::ReadFile => (
                "Read the contents of a file. Accepts relative or absolute paths.",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "File path (relative or absolute)"
                        }
                    },
                    "required": ["file_path"]
                }),
            ),
            Tool::ReadMultipleFiles => (
                "Read the contents of several files at once (at most 10 per call).",
                json!({
                    "type": "object",
                    "properties": {
                        "file_paths": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "List of file paths"
                        }
                    },
                    "required": ["file_paths"]
                }),
            ),
            Tool::ListFiles => (
                "List files in a directory, optionally recursively.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory": {
                            "type": "string",
                            "description": "Directory path, defaults to the current directory"
                        },
                        "pattern": {
                            "type": "string",
                            "description": "File name pattern, e.g. *.go"
                        },
                        "recursive": {
                            "type": "boolean",
                            "description": "Whether to search subdirectories"
                        }
                    }
                }),
            ),
            Tool::SearchInFiles => (
                "Search files for a literal keyword and report matching lines.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory": {
                            "type": "string",
                            "description": "Directory to search"
                        },
                        "pattern": {
                            "type": "string",
                            "description": "Text to search for"
                        },
                        "file_extension": {
                            "type": "string",
                            "description": "Only search files with this extension, e.g. .go"
                        }
                    },
                    "required": ["directory", "pattern"]
                }),
            ),
            Tool::AnalyzeDirectory => (
                "Analyze a directory: file counts, sizes, extensions, and a list of code files.",
                json!({
                    "type": "object",
                    "properties": {
                        "directory": {
                            "type": "string",
                            "description": "Directory path to analyze"
                        }
                    },
                    "required": ["directory"]
                }),
            ),
            Tool::GetGitDiff => (
                "Get the code changes in the git repository.",
                json!({
                    "type": "object",
                    "properties": {
                        "target": {
                            "type": "string",
                            "description": "Revision to diff against, e.g. HEAD, main, or a commit hash"
                        }
                    }
                }),
            ),
            Tool::RunLinter => (
                "Run a linter for the file's language (golangci-lint, eslint, pylint, ...).",
                json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Path of the file to lint"
                        }
                    }
                }),
            ),
        };

        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name().to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Get the tool definitions for the chat-completions API.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    Tool::ALL.iter().map(|tool| tool.definition()).collect()
}

/// Arguments decoded from a model-generated JSON string.
///
/// Decoding never fails: malformed input or a non-object yields an empty
/// mapping, and accessors fall back to defaults for missing or
/// wrongly-typed keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self(map),
            Ok(other) => {
                debug!("Tool arguments are not an object: {}", other);
                Self::default()
            }
            Err(e) => {
                debug!("Malformed tool arguments {:?}: {}", raw, e);
                Self::default()
            }
        }
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).and_then(Value::as_str).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// String elements of an array argument; `None` if the key is not an array.
    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        let items = self.0.get(key)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
        )
    }
}

impl fmt::Display for ToolArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

/// Outcome of one tool call, ready to become a tool-role message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub success: bool,
    /// Tool output, or the embedded error description on failure.
    pub content: String,
}

impl ToolResult {
    pub fn success(content: String) -> Self {
        Self {
            success: true,
            content,
        }
    }

    /// Failure text naming the tool and carrying the error detail.
    pub fn failure(tool_name: &str, error: &ToolError) -> Self {
        Self {
            success: false,
            content: format!(
                "[error] Tool execution failed: {}\nDetails: {}",
                tool_name, error
            ),
        }
    }
}

/// The tools executor that handles tool calls.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    scanner: FileScanner,
    max_diff_chars: usize,
}

impl ToolExecutor {
    /// Create an executor operating on the tree rooted at `work_dir`.
    pub fn new(work_dir: PathBuf, limits: &ToolsConfig) -> Self {
        Self {
            scanner: FileScanner::new(work_dir, ScanConfig::from(limits)),
            max_diff_chars: limits.max_diff_chars,
        }
    }

    /// Execute a tool call, folding any failure into the result text.
    pub async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();
        match self.execute(name, &call.function.arguments).await {
            Ok(content) => ToolResult::success(content),
            Err(e) => ToolResult::failure(name, &e),
        }
    }

    /// Execute the named tool with raw JSON `arguments`.
    pub async fn execute(&self, name: &str, arguments: &str) -> Result<String, ToolError> {
        let tool =
            Tool::from_name(name).ok_or_else(|| ToolError::UnsupportedTool(name.to_string()))?;
        let args = ToolArgs::parse(arguments);

        debug!("Executing tool: {} with args: {}", tool, args);

        let work_dir = self.scanner.root();
        match tool {
            Tool::GetWorkingDirectory => {
                let cwd =
                    std::fs::canonicalize(work_dir).unwrap_or_else(|_| work_dir.to_path_buf());
                Ok(format!("Current working directory: {}", cwd.display()))
            }
            Tool::ReadFile => self.scanner.read_file(args.str_or("file_path", "")),
            Tool::ReadMultipleFiles => {
                let paths = args.string_list("file_paths").ok_or_else(|| {
                    ToolError::InvalidInput("file_paths must be an array".to_string())
                })?;
                Ok(self.scanner.read_multiple_files(&paths))
            }
            Tool::ListFiles => self.scanner.list_files(
                args.str_or("directory", "."),
                args.str_or("pattern", "*"),
                args.bool_or("recursive", false),
            ),
            Tool::SearchInFiles => self.scanner.search_in_files(
                args.str_or("directory", "."),
                args.str_or("pattern", ""),
                args.str_or("file_extension", ""),
            ),
            Tool::AnalyzeDirectory => self
                .scanner
                .analyze_directory(args.str_or("directory", ".")),
            Tool::GetGitDiff => {
                get_git_diff(
                    work_dir,
                    args.str_or("target", DEFAULT_TARGET),
                    self.max_diff_chars,
                )
                .await
            }
            Tool::RunLinter => run_linter(work_dir, args.str_or("file_path", "")).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn executor_at(dir: &TempDir) -> ToolExecutor {
        ToolExecutor::new(dir.path().to_path_buf(), &ToolsConfig::default())
    }

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 8);

        let names: HashSet<_> = tools.iter().map(|t| t.function.name.as_str()).collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains("read_file"));
        assert!(names.contains("get_git_diff"));
        assert!(names.contains("get_working_directory"));
        assert!(tools.iter().all(|t| t.tool_type == "function"));
    }

    #[test]
    fn test_required_parameters() {
        let required = |tool: Tool| tool.definition().function.parameters["required"].clone();

        assert_eq!(required(Tool::ReadFile), json!(["file_path"]));
        assert_eq!(required(Tool::ReadMultipleFiles), json!(["file_paths"]));
        assert_eq!(required(Tool::SearchInFiles), json!(["directory", "pattern"]));
        assert_eq!(required(Tool::AnalyzeDirectory), json!(["directory"]));
        assert_eq!(required(Tool::GetGitDiff), Value::Null);
    }

    #[test]
    fn test_tool_name_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("delete_everything"), None);
    }

    #[test]
    fn test_tool_args_tolerate_malformed_input() {
        assert_eq!(ToolArgs::parse("{not json"), ToolArgs::default());
        assert_eq!(ToolArgs::parse("[1, 2]"), ToolArgs::default());
        assert_eq!(ToolArgs::parse(""), ToolArgs::default());

        let args = ToolArgs::parse(r#"{"directory": 5, "recursive": "yes"}"#);
        assert_eq!(args.str_or("directory", "."), ".");
        assert!(!args.bool_or("recursive", false));
    }

    #[test]
    fn test_string_list_skips_non_strings() {
        let args = ToolArgs::parse(r#"{"file_paths": ["a.rs", 3, null, "b.rs"]}"#);
        assert_eq!(
            args.string_list("file_paths"),
            Some(vec!["a.rs".to_string(), "b.rs".to_string()])
        );
        assert_eq!(ToolArgs::parse(r#"{"file_paths": "a.rs"}"#).string_list("file_paths"), None);
    }

    #[tokio::test]
    async fn test_execute_read_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("main.go"), "package main").unwrap();

        let result = executor_at(&temp_dir)
            .execute("read_file", r#"{"file_path": "main.go"}"#)
            .await
            .unwrap();
        assert_eq!(result, "=== main.go ===\npackage main");
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let temp_dir = TempDir::new().unwrap();
        let err = executor_at(&temp_dir)
            .execute("format_disk", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnsupportedTool(ref name) if name == "format_disk"));
    }

    #[tokio::test]
    async fn test_execute_call_embeds_failure() {
        let temp_dir = TempDir::new().unwrap();
        let call = ToolCall::new("call_7", "read_file", "not even json");

        let result = executor_at(&temp_dir).execute_call(&call).await;
        assert!(!result.success);
        assert!(result.content.contains("Tool execution failed: read_file"));
        assert!(result.content.contains("file_path is required"));
    }

    #[tokio::test]
    async fn test_execute_read_multiple_requires_array() {
        let temp_dir = TempDir::new().unwrap();
        let err = executor_at(&temp_dir)
            .execute("read_multiple_files", r#"{"file_paths": "a.rs"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_execute_list_files_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "abc").unwrap();

        let result = executor_at(&temp_dir)
            .execute("list_files", "{}")
            .await
            .unwrap();
        assert!(result.contains("a.txt (3 bytes)"));
    }

    #[tokio::test]
    async fn test_execute_get_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = executor_at(&temp_dir)
            .execute("get_working_directory", "")
            .await
            .unwrap();
        let expected = fs::canonicalize(temp_dir.path()).unwrap();
        assert_eq!(
            result,
            format!("Current working directory: {}", expected.display())
        );
    }

    #[tokio::test]
    async fn test_execute_search_without_matches() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.rs"), "fn main() {}").unwrap();

        let result = executor_at(&temp_dir)
            .execute(
                "search_in_files",
                r#"{"directory": ".", "pattern": "password"}"#,
            )
            .await;
        tokio_test::assert_ok!(&result);
        assert_eq!(result.unwrap(), "No matches found");
    }
}
