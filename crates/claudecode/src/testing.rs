//! Testing utilities for integration tests
//!
//! Re-exports the scripted process doubles from the transport crate and adds
//! JSON line fixtures shaped like real CLI output, so clients can be tested
//! without a Claude Code installation.
//!
//! ```
//! use claudecode::testing::{ScriptedProcess, fixtures};
//!
//! let script = ScriptedProcess::new().with_lines(fixtures::conversation("session-1", "4"));
//! ```

pub use claudecode_transport::testing::{ScriptedProcess, ScriptedSpawner};

/// JSON lines as the CLI prints them in `stream-json` mode
pub mod fixtures {
    use serde_json::json;

    /// `system` / `init` message opening a session
    pub fn system_init(session_id: &str) -> String {
        json!({
            "type": "system",
            "subtype": "init",
            "session_id": session_id,
            "tools": ["Read", "Write", "Bash"],
            "model": "claude-sonnet-4-5",
            "permissionMode": "default"
        })
        .to_string()
    }

    /// Assistant message with a single text block
    pub fn assistant_text(text: &str) -> String {
        json!({
            "type": "assistant",
            "message": {
                "role": "assistant",
                "content": [{"type": "text", "text": text}]
            }
        })
        .to_string()
    }

    /// Assistant message requesting a tool
    pub fn assistant_tool_use(id: &str, name: &str, input: serde_json::Value) -> String {
        json!({
            "type": "assistant",
            "message": {
                "role": "assistant",
                "content": [{"type": "tool_use", "id": id, "name": name, "input": input}]
            }
        })
        .to_string()
    }

    /// User message carrying a tool result back to the model
    pub fn user_tool_result(tool_use_id: &str, content: &str) -> String {
        json!({
            "type": "user",
            "message": {
                "role": "user",
                "content": [{"type": "tool_result", "tool_use_id": tool_use_id, "content": content}]
            }
        })
        .to_string()
    }

    /// Successful `result` message
    pub fn result_success(session_id: &str, result: &str) -> String {
        json!({
            "type": "result",
            "subtype": "success",
            "duration_ms": 1520,
            "duration_api_ms": 1210,
            "is_error": false,
            "num_turns": 1,
            "session_id": session_id,
            "total_cost_usd": 0.0031,
            "usage": {"input_tokens": 12, "output_tokens": 4},
            "result": result
        })
        .to_string()
    }

    /// `init`, one assistant answer, then a successful result
    pub fn conversation(session_id: &str, answer: &str) -> Vec<String> {
        vec![
            system_init(session_id),
            assistant_text(answer),
            result_success(session_id, answer),
        ]
    }
}
