//! MCP Tool definitions
//!
//! The server provides a single tool, `lint_clojure`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name of the clj-kondo tool
pub const LINT_TOOL: &str = "lint_clojure";

/// Tool definition following MCP schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for input parameters
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        ToolDefinition {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool result content type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Text of the first content block
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Generate all tool definitions
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition::new(
        LINT_TOOL,
        "Lint Clojure/ClojureScript/EDN code using clj-kondo. Accepts a file, a directory or a classpath string.",
        json!({
            "type": "object",
            "properties": {
                "target": {
                    "type": "string",
                    "description": "Absolute path to a file or directory to lint, or a classpath string"
                },
                "configDir": {
                    "type": "string",
                    "description": "Absolute path to a clj-kondo config directory (optional, passed as --config-dir)"
                }
            },
            "required": ["target"]
        }),
    )]
}

/// Get tool by name
pub fn get_tool(name: &str) -> Option<ToolDefinition> {
    all_tools().into_iter().find(|t| t.name == name)
}
