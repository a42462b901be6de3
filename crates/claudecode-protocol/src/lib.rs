//! Shared protocol types for the Claude Code CLI SDK
//!
//! This crate provides the data types exchanged with the Claude Code CLI in
//! `stream-json` mode, and the option types that shape a CLI invocation.
//!
//! # Type Organization
//!
//! - **Content types**: [`content`] - text, tool use and tool result blocks
//! - **Message types**: [`message`] - user, assistant, system and result messages
//! - **Option types**: [`options`] - per-query configuration snapshot
//! - **Common types**: [`types`] - permission modes, MCP server definitions
//!
//! # Design Principles
//!
//! - **Zero I/O**: All types are pure data structures
//! - **Closed unions**: messages and content blocks are enums, so matches stay exhaustive
//! - **Serialization**: serde-based

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod content;
pub mod message;
pub mod options;
pub mod types;

// Re-export commonly used types at crate level
pub use content::ContentBlock;
pub use message::{AssistantMessage, Message, ResultMessage, SystemMessage, UserMessage};
pub use options::{DEFAULT_QUERY_TIMEOUT, QueryOptions};
pub use types::{McpServerConfig, PermissionMode};
