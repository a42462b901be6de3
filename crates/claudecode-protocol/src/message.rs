//! Message types for the stream-json protocol
//!
//! Every line the CLI writes in `stream-json` mode decodes into one of four
//! message kinds. The types here are immutable values; derived views such as
//! the concatenated assistant text are computed on each call.

use crate::content::ContentBlock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message emitted by the Claude Code CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// User message (prompt echo or tool results fed back to the model)
    User(UserMessage),

    /// Assistant response
    Assistant(AssistantMessage),

    /// System message from the CLI (init, notices)
    System(SystemMessage),

    /// Final result message of a query
    Result(ResultMessage),
}

impl Message {
    /// Get the wire discriminator of this message
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::Assistant(_) => "assistant",
            Self::System(_) => "system",
            Self::Result(_) => "result",
        }
    }

    /// Borrow the assistant payload if this is an assistant message
    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(msg) => Some(msg),
            _ => None,
        }
    }

    /// Borrow the result payload if this is a result message
    pub fn as_result(&self) -> Option<&ResultMessage> {
        match self {
            Self::Result(msg) => Some(msg),
            _ => None,
        }
    }

    /// Check if this is the final result message
    pub fn is_result(&self) -> bool {
        matches!(self, Self::Result(_))
    }
}

/// A user message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserMessage {
    /// Message content
    pub content: String,
}

impl UserMessage {
    /// Create a user message
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// An assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    /// The content blocks in wire order
    pub content: Vec<ContentBlock>,
}

impl AssistantMessage {
    /// Create an assistant message from content blocks
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self { content }
    }

    /// Concatenated text of all text blocks, without separators
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect()
    }

    /// All text blocks in order
    pub fn text_blocks(&self) -> Vec<&ContentBlock> {
        self.content.iter().filter(|b| b.is_text()).collect()
    }

    /// All tool use blocks in order
    pub fn tool_use_blocks(&self) -> Vec<&ContentBlock> {
        self.content.iter().filter(|b| b.is_tool_use()).collect()
    }

    /// All tool result blocks in order
    pub fn tool_result_blocks(&self) -> Vec<&ContentBlock> {
        self.content.iter().filter(|b| b.is_tool_result()).collect()
    }
}

/// A system message from the Claude CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemMessage {
    /// Subtype of the system message
    pub subtype: String,

    /// Remaining fields of the wire object, without the `type` discriminator
    pub data: Map<String, Value>,
}

impl SystemMessage {
    /// Look up a payload field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// A result message indicating query completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultMessage {
    /// Subtype of the result message (`success`, `error_max_turns`, ...)
    pub subtype: String,

    /// Wall clock duration in milliseconds
    pub duration_ms: u64,

    /// API duration in milliseconds
    pub duration_api_ms: u64,

    /// Whether the result is an error
    pub is_error: bool,

    /// Number of turns in the conversation
    pub num_turns: u32,

    /// Session identifier
    pub session_id: String,

    /// Total cost in USD (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,

    /// Raw token usage object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Map<String, Value>>,

    /// Final result text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl ResultMessage {
    /// Input tokens reported in `usage`, absent when not reported
    pub fn input_tokens(&self) -> Option<u64> {
        self.usage_field("input_tokens")
    }

    /// Output tokens reported in `usage`, absent when not reported
    pub fn output_tokens(&self) -> Option<u64> {
        self.usage_field("output_tokens")
    }

    /// Total tokens, falling back to input + output when not reported directly
    pub fn total_tokens(&self) -> Option<u64> {
        self.usage_field("total_tokens").or_else(|| {
            self.input_tokens()?
                .checked_add(self.output_tokens()?)
        })
    }

    fn usage_field(&self, key: &str) -> Option<u64> {
        self.usage.as_ref()?.get(key)?.as_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result_with_usage(usage: Option<Value>) -> ResultMessage {
        ResultMessage {
            subtype: "success".into(),
            duration_ms: 5000,
            duration_api_ms: 4500,
            is_error: false,
            num_turns: 3,
            session_id: "session-123".into(),
            total_cost_usd: Some(0.15),
            usage: usage.and_then(|u| u.as_object().cloned()),
            result: Some("Operation completed".into()),
        }
    }

    #[test]
    fn test_assistant_derived_views() {
        let message = AssistantMessage::new(vec![
            ContentBlock::text("Hello"),
            ContentBlock::tool_use("1", "read", Map::new()),
            ContentBlock::text(" World"),
            ContentBlock::tool_result("1", "ok"),
        ]);

        assert_eq!(message.text(), "Hello World");
        assert_eq!(message.text_blocks().len(), 2);
        assert_eq!(message.tool_use_blocks().len(), 1);
        assert_eq!(message.tool_result_blocks().len(), 1);
    }

    #[test]
    fn test_assistant_text_empty_without_text_blocks() {
        let message = AssistantMessage::new(vec![ContentBlock::tool_use("1", "read", Map::new())]);
        assert_eq!(message.text(), "");
    }

    #[test]
    fn test_result_token_accessors() {
        let msg = result_with_usage(Some(json!({
            "input_tokens": 100,
            "output_tokens": 200,
            "total_tokens": 300
        })));
        assert_eq!(msg.input_tokens(), Some(100));
        assert_eq!(msg.output_tokens(), Some(200));
        assert_eq!(msg.total_tokens(), Some(300));
    }

    #[test]
    fn test_result_tokens_absent_without_usage() {
        let msg = result_with_usage(None);
        assert_eq!(msg.input_tokens(), None);
        assert_eq!(msg.output_tokens(), None);
        assert_eq!(msg.total_tokens(), None);
        assert_eq!(msg.total_cost_usd, Some(0.15));
        assert_eq!(msg.result.as_deref(), Some("Operation completed"));
    }

    #[test]
    fn test_result_tokens_malformed_usage() {
        let msg = result_with_usage(Some(json!({"input_tokens": "many", "output_tokens": 5})));
        assert_eq!(msg.input_tokens(), None);
        assert_eq!(msg.output_tokens(), Some(5));
        assert_eq!(msg.total_tokens(), None);
    }

    #[test]
    fn test_total_tokens_falls_back_to_sum() {
        let msg = result_with_usage(Some(json!({"input_tokens": 10, "output_tokens": 32})));
        assert_eq!(msg.total_tokens(), Some(42));
    }

    #[test]
    fn test_message_accessors() {
        let msg = Message::Result(result_with_usage(None));
        assert!(msg.is_result());
        assert_eq!(msg.type_name(), "result");
        assert!(msg.as_assistant().is_none());
        assert_eq!(msg.as_result().map(|r| r.num_turns), Some(3));
    }
}
