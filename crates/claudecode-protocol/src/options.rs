//! Per-query options
//!
//! A `QueryOptions` value is a snapshot: the query that receives it keeps its
//! own copy for its whole lifetime. Changing options means building a new value.

use crate::types::{McpServerConfig, PermissionMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default deadline for a single query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(600);

/// Options controlling a single query against the Claude Code CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Tools the CLI may use without asking
    #[serde(default)]
    pub allowed_tools: Vec<String>,

    /// Tools the CLI must not use
    #[serde(default)]
    pub disallowed_tools: Vec<String>,

    /// Replacement system prompt
    pub system_prompt: Option<String>,

    /// Text appended to the system prompt
    pub append_system_prompt: Option<String>,

    /// Budget for extended thinking tokens
    pub max_thinking_tokens: Option<u32>,

    /// Permission mode for tool use
    #[serde(default)]
    pub permission_mode: PermissionMode,

    /// Continue the most recent conversation
    #[serde(default)]
    pub continue_conversation: bool,

    /// Session id to resume
    pub resume: Option<String>,

    /// Maximum number of agent turns
    pub max_turns: Option<u32>,

    /// Model identifier
    pub model: Option<String>,

    /// Working directory for the CLI process
    pub cwd: Option<PathBuf>,

    /// Deadline for the whole query, from process start to exit
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Named MCP servers passed through `--mcp-config`
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
}

fn default_timeout() -> Duration {
    DEFAULT_QUERY_TIMEOUT
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            allowed_tools: Vec::new(),
            disallowed_tools: Vec::new(),
            system_prompt: None,
            append_system_prompt: None,
            max_thinking_tokens: None,
            permission_mode: PermissionMode::Default,
            continue_conversation: false,
            resume: None,
            max_turns: None,
            model: None,
            cwd: None,
            timeout: DEFAULT_QUERY_TIMEOUT,
            mcp_servers: BTreeMap::new(),
        }
    }
}

impl QueryOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allowed tools
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set the disallowed tools
    pub fn with_disallowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disallowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Append to the system prompt
    pub fn with_append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_system_prompt = Some(prompt.into());
        self
    }

    /// Set the thinking token budget
    pub fn with_max_thinking_tokens(mut self, tokens: u32) -> Self {
        self.max_thinking_tokens = Some(tokens);
        self
    }

    /// Set the permission mode
    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    /// Continue the most recent conversation
    pub fn with_continue_conversation(mut self, enable: bool) -> Self {
        self.continue_conversation = enable;
        self
    }

    /// Resume a previous session by id
    pub fn with_resume(mut self, session_id: impl Into<String>) -> Self {
        self.resume = Some(session_id.into());
        self
    }

    /// Limit the number of agent turns
    pub fn with_max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the working directory of the CLI process
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the query deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a named MCP server
    pub fn add_mcp_server(mut self, name: impl Into<String>, server: McpServerConfig) -> Self {
        self.mcp_servers.insert(name.into(), server);
        self
    }
}
