//! Content block types
//!
//! Assistant messages carry an ordered list of content blocks. The CLI tags
//! each block with a `type` field of `text`, `tool_use` or `tool_result`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A content block in an assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },

    /// A request from the model to use a tool.
    #[serde(rename = "tool_use")]
    ToolUse {
        /// The unique identifier for this tool use request.
        id: String,
        /// The name of the tool to be used.
        name: String,
        /// The input to the tool, as a JSON object.
        #[serde(default)]
        input: Map<String, Value>,
    },

    /// The result of a tool execution.
    #[serde(rename = "tool_result")]
    ToolResult {
        /// The `id` of the `tool_use` block this result is for.
        tool_use_id: String,
        /// The content of the tool's output.
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Whether the tool execution resulted in an error.
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

impl ContentBlock {
    /// Create a text content block
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool use content block
    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: Map<String, Value>,
    ) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    /// Create a tool result content block
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: Some(content.into()),
            is_error: None,
        }
    }

    /// Create an error tool result
    pub fn tool_error(tool_use_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: Some(error.into()),
            is_error: Some(true),
        }
    }

    /// Get the wire discriminator of this content block
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
        }
    }

    /// Check if this is a text block
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// Check if this is a tool use block
    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    /// Check if this is a tool result block
    pub fn is_tool_result(&self) -> bool {
        matches!(self, Self::ToolResult { .. })
    }

    /// Extract text if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Extract tool use if this is a tool use block
    pub fn as_tool_use(&self) -> Option<(&str, &str, &Map<String, Value>)> {
        match self {
            Self::ToolUse { id, name, input } => Some((id, name, input)),
            _ => None,
        }
    }

    /// Extract the tool use id and content if this is a tool result block
    pub fn as_tool_result(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Self::ToolResult {
                tool_use_id,
                content,
                ..
            } => Some((tool_use_id, content.as_deref())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_use_content() {
        let mut input = Map::new();
        input.insert("command".into(), Value::from("ls"));
        let content = ContentBlock::tool_use("id_123", "bash", input);
        assert!(content.is_tool_use());
        assert_eq!(content.type_name(), "tool_use");
        let (id, name, input) = content.as_tool_use().unwrap();
        assert_eq!(id, "id_123");
        assert_eq!(name, "bash");
        assert_eq!(input.get("command"), Some(&Value::from("ls")));
    }

    #[test]
    fn test_content_type_checks() {
        let text = ContentBlock::text("test");
        assert!(text.is_text());
        assert!(!text.is_tool_use());
        assert_eq!(text.as_text(), Some("test"));
        assert_eq!(text.as_tool_result(), None);
    }

    #[test]
    fn test_tool_error_sets_flag() {
        let block = ContentBlock::tool_error("t1", "boom");
        assert_eq!(
            block,
            ContentBlock::ToolResult {
                tool_use_id: "t1".into(),
                content: Some("boom".into()),
                is_error: Some(true),
            }
        );
        assert_eq!(block.as_tool_result(), Some(("t1", Some("boom"))));
    }

    #[test]
    fn test_serializes_with_wire_discriminator() {
        let json = serde_json::to_value(ContentBlock::tool_result("t1", "ok")).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["tool_use_id"], "t1");
        assert!(json.get("is_error").is_none());
    }
}
