//! Common type definitions used by query options
//!
//! Permission modes and MCP server definitions, serialized exactly as the
//! Claude Code CLI expects them on its command line.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Permission mode for tool use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Default: ask for permission for each tool use
    #[default]
    Default,

    /// Automatically accept edits without asking
    AcceptEdits,

    /// Bypass permission checks entirely
    BypassPermissions,
}

impl PermissionMode {
    /// The value passed to `--permission-mode`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::BypassPermissions => "bypassPermissions",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An external tool server made available to the CLI through `--mcp-config`
///
/// Definitions without a `type` field deserialize as [`McpServerConfig::Stdio`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(remote = "Self", tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    /// Server launched as a child process speaking over stdio
    Stdio {
        /// Executable to launch
        command: String,
        /// Arguments for the executable
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Extra environment for the server process
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        env: BTreeMap<String, String>,
    },

    /// Server reached over server-sent events
    Sse {
        /// Endpoint URL
        url: String,
        /// Extra request headers
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },

    /// Server reached over streamable HTTP
    Http {
        /// Endpoint URL
        url: String,
        /// Extra request headers
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl Serialize for McpServerConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        McpServerConfig::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for McpServerConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = Map::<String, Value>::deserialize(deserializer)?;
        object
            .entry("type")
            .or_insert_with(|| Value::from("stdio"));
        McpServerConfig::deserialize(Value::Object(object)).map_err(de::Error::custom)
    }
}

impl McpServerConfig {
    /// Create a stdio server definition
    pub fn stdio<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Stdio {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        }
    }

    /// Create an SSE server definition
    pub fn sse(url: impl Into<String>) -> Self {
        Self::Sse {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// Create an HTTP server definition
    pub fn http(url: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PermissionMode::Default, "default")]
    #[case(PermissionMode::AcceptEdits, "acceptEdits")]
    #[case(PermissionMode::BypassPermissions, "bypassPermissions")]
    fn test_permission_mode_cli_value(#[case] mode: PermissionMode, #[case] expected: &str) {
        assert_eq!(mode.as_str(), expected);
        assert_eq!(mode.to_string(), expected);
        assert_eq!(
            serde_json::to_value(mode).unwrap(),
            serde_json::Value::from(expected)
        );
    }

    #[test]
    fn test_stdio_server_serialization() {
        let server = McpServerConfig::stdio("npx", ["-y", "@modelcontextprotocol/server-memory"]);
        let json = serde_json::to_value(&server).unwrap();
        assert_eq!(json["type"], "stdio");
        assert_eq!(json["command"], "npx");
        assert_eq!(json["args"][1], "@modelcontextprotocol/server-memory");
        assert!(json.get("env").is_none());
    }

    #[test]
    fn test_untyped_server_is_stdio() {
        let server: McpServerConfig =
            serde_json::from_str(r#"{"command": "mcp-server", "args": ["--port", "0"]}"#).unwrap();
        assert_eq!(server, McpServerConfig::stdio("mcp-server", ["--port", "0"]));

        let sse: McpServerConfig =
            serde_json::from_str(r#"{"type": "sse", "url": "http://localhost:9000"}"#).unwrap();
        assert_eq!(sse, McpServerConfig::sse("http://localhost:9000"));
    }

    #[test]
    fn test_http_server_serialization() {
        let json = serde_json::to_value(McpServerConfig::http("https://example.com/mcp")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "http", "url": "https://example.com/mcp"})
        );
    }
}
