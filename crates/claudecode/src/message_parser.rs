//! Message parsing for the Claude Code CLI `stream-json` protocol.
//!
//! Turns one decoded JSON object from the CLI into one typed [`Message`].
//! The CLI puts a `type` discriminator at the top level; user and assistant
//! payloads are nested under `message`.
//!
//! Parsing is lenient: [`parse_message`] never fails, it returns `None` for
//! anything it cannot turn into a message, so one odd line never aborts a
//! stream. [`try_parse_message`] reports why an object was rejected.
//!
//! # Message Types
//!
//! - `user`: prompts and tool results echoed back by the CLI
//! - `assistant`: model output as content blocks
//! - `system`: CLI notifications (`init`, ...)
//! - `result`: final message with cost, usage and session id
//!
//! # Example
//!
//! ```
//! use claudecode::message_parser::parse_message;
//! use serde_json::json;
//!
//! let value = json!({
//!     "type": "assistant",
//!     "message": {
//!         "content": [{"type": "text", "text": "Hello"}]
//!     }
//! });
//!
//! let message = parse_message(&value).unwrap();
//! assert_eq!(message.as_assistant().unwrap().text(), "Hello");
//! ```

use claudecode_protocol::{
    AssistantMessage, ContentBlock, Message, ResultMessage, SystemMessage, UserMessage,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Errors that can occur during message parsing
#[derive(Debug, thiserror::Error)]
pub enum MessageParseError {
    /// Invalid message format
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Unknown message type
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// Invalid content block
    #[error("Invalid content block: {0}")]
    InvalidContentBlock(String),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type Object = Map<String, Value>;
type MessageDecoder = fn(&Object) -> Result<Message, MessageParseError>;
type BlockDecoder = fn(&Object) -> Result<ContentBlock, MessageParseError>;

const MESSAGE_DECODERS: &[(&str, MessageDecoder)] = &[
    ("user", decode_user),
    ("assistant", decode_assistant),
    ("system", decode_system),
    ("result", decode_result),
];

const BLOCK_DECODERS: &[(&str, BlockDecoder)] = &[
    ("text", decode_text_block),
    ("tool_use", decode_tool_use_block),
    ("tool_result", decode_tool_result_block),
];

/// Parse a JSON value into a typed message
///
/// Returns `None` for non-objects, unknown discriminators and objects
/// missing required fields.
pub fn parse_message(data: &Value) -> Option<Message> {
    try_parse_message(data).ok()
}

/// Parse a JSON value into a typed message, reporting why it was rejected
///
/// # Errors
///
/// Returns `MessageParseError` if:
/// - The value is not an object
/// - The `type` field is missing or unknown
/// - A required field is missing or has the wrong JSON type
pub fn try_parse_message(data: &Value) -> Result<Message, MessageParseError> {
    let object = data.as_object().ok_or_else(|| {
        MessageParseError::InvalidFormat(format!("expected object, got {}", json_type(data)))
    })?;
    let message_type = str_field(object, "type").ok_or(MessageParseError::MissingField("type"))?;

    let decode = lookup(MESSAGE_DECODERS, message_type)
        .ok_or_else(|| MessageParseError::UnknownType(message_type.to_string()))?;
    decode(object)
}

/// Parse one line of CLI output
///
/// # Errors
///
/// Returns `MessageParseError` if the line is not JSON or not a message
pub fn parse_message_str(s: &str) -> Result<Message, MessageParseError> {
    let value: Value = serde_json::from_str(s)?;
    try_parse_message(&value)
}

/// Parse a single content block
///
/// Returns `None` for unknown block types and blocks missing required fields.
pub fn parse_content_block(data: &Value) -> Option<ContentBlock> {
    let object = data.as_object()?;
    let decode = lookup(BLOCK_DECODERS, str_field(object, "type")?)?;
    decode(object).ok()
}

fn lookup<F: Copy>(table: &[(&str, F)], key: &str) -> Option<F> {
    table
        .iter()
        .find_map(|(name, decode)| (*name == key).then_some(*decode))
}

fn decode_user(object: &Object) -> Result<Message, MessageParseError> {
    // Content normally sits under `message`; older CLIs put it at the top level
    let content = object
        .get("message")
        .and_then(Value::as_object)
        .and_then(|message| message.get("content"))
        .or_else(|| object.get("content"))
        .ok_or(MessageParseError::MissingField("message.content"))?;

    let content = match content {
        Value::String(text) => text.clone(),
        // Tool results come back as block arrays; keep them as compact JSON
        Value::Array(_) => content.to_string(),
        other => {
            return Err(MessageParseError::InvalidFormat(format!(
                "user content must be string or array, got {}",
                json_type(other)
            )));
        }
    };
    Ok(Message::User(UserMessage::new(content)))
}

fn decode_assistant(object: &Object) -> Result<Message, MessageParseError> {
    let blocks = object
        .get("message")
        .and_then(Value::as_object)
        .and_then(|message| message.get("content"))
        .and_then(Value::as_array)
        .ok_or(MessageParseError::MissingField("message.content"))?;

    let content = blocks
        .iter()
        .filter_map(|block| {
            let parsed = parse_content_block(block);
            if parsed.is_none() {
                debug!(block = %block, "Dropping unrecognized content block");
            }
            parsed
        })
        .collect();
    Ok(Message::Assistant(AssistantMessage::new(content)))
}

fn decode_system(object: &Object) -> Result<Message, MessageParseError> {
    let subtype = str_field(object, "subtype").ok_or(MessageParseError::MissingField("subtype"))?;
    let mut data = object.clone();
    data.remove("type");
    Ok(Message::System(SystemMessage {
        subtype: subtype.to_string(),
        data,
    }))
}

fn decode_result(object: &Object) -> Result<Message, MessageParseError> {
    let num_turns =
        u64_field(object, "num_turns").ok_or(MessageParseError::MissingField("num_turns"))?;
    let num_turns = u32::try_from(num_turns).map_err(|_| {
        MessageParseError::InvalidFormat(format!("num_turns out of range: {num_turns}"))
    })?;

    Ok(Message::Result(ResultMessage {
        subtype: str_field(object, "subtype")
            .ok_or(MessageParseError::MissingField("subtype"))?
            .to_string(),
        duration_ms: u64_field(object, "duration_ms")
            .ok_or(MessageParseError::MissingField("duration_ms"))?,
        duration_api_ms: u64_field(object, "duration_api_ms")
            .ok_or(MessageParseError::MissingField("duration_api_ms"))?,
        is_error: object
            .get("is_error")
            .and_then(Value::as_bool)
            .ok_or(MessageParseError::MissingField("is_error"))?,
        num_turns,
        session_id: str_field(object, "session_id")
            .ok_or(MessageParseError::MissingField("session_id"))?
            .to_string(),
        total_cost_usd: object.get("total_cost_usd").and_then(Value::as_f64),
        usage: object.get("usage").and_then(Value::as_object).cloned(),
        result: str_field(object, "result").map(String::from),
    }))
}

fn decode_text_block(object: &Object) -> Result<ContentBlock, MessageParseError> {
    let text = str_field(object, "text").ok_or(MessageParseError::MissingField("text"))?;
    Ok(ContentBlock::text(text))
}

fn decode_tool_use_block(object: &Object) -> Result<ContentBlock, MessageParseError> {
    let id = str_field(object, "id").ok_or(MessageParseError::MissingField("id"))?;
    let name = str_field(object, "name").ok_or(MessageParseError::MissingField("name"))?;
    let input = object
        .get("input")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(ContentBlock::tool_use(id, name, input))
}

fn decode_tool_result_block(object: &Object) -> Result<ContentBlock, MessageParseError> {
    let tool_use_id =
        str_field(object, "tool_use_id").ok_or(MessageParseError::MissingField("tool_use_id"))?;
    Ok(ContentBlock::ToolResult {
        tool_use_id: tool_use_id.to_string(),
        content: object.get("content").and_then(tool_result_text),
        is_error: object.get("is_error").and_then(Value::as_bool),
    })
}

/// Tool result content is either a string or a list of text blocks
fn tool_result_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => {
            let texts: Vec<&str> = blocks
                .iter()
                .filter_map(|block| {
                    let block = block.as_object()?;
                    (str_field(block, "type")? == "text").then(|| str_field(block, "text"))?
                })
                .collect();
            (!texts.is_empty()).then(|| texts.concat())
        }
        _ => None,
    }
}

fn str_field<'a>(object: &'a Object, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn u64_field(object: &Object, key: &str) -> Option<u64> {
    object.get(key).and_then(Value::as_u64)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
