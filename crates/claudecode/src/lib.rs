//! Rust SDK for the Claude Code CLI
//!
//! Runs the `claude` command line tool in `stream-json` mode and turns its
//! output into typed messages. Each query starts one CLI process, reads its
//! stdout line by line and stops the process when the query ends.
//!
//! # Key Features
//!
//! - **Streaming**: consume messages as the CLI prints them
//! - **Eager collection**: await the full message list
//! - **Outcomes**: a non-failing three-way result that keeps partial output
//! - **Async tasks**: spawn queries on the runtime and await them later
//! - **Shutdown**: closing the client kills every query still running
//!
//! # Architecture
//!
//! The SDK is built on three layers:
//!
//! 1. **Protocol Layer** (`claudecode-protocol`): message and option types
//! 2. **Transport Layer** (`claudecode-transport`): CLI process management
//! 3. **Client Layer** (this crate): parsing, orchestration, client API
//!
//! # Usage Example
//!
//! ```no_run
//! use claudecode::{ClaudeCodeClient, ClientConfig, Outcome, QueryOptions, QueryRequest};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ClaudeCodeClient::new(ClientConfig::from_env()?)?;
//!
//!     let options = QueryOptions::new().with_model("sonnet").with_max_turns(1);
//!     let request = QueryRequest::new("What is 2 + 2?")?.with_options(options);
//!
//!     let mut stream = client.query_stream(request);
//!     while let Some(message) = stream.next().await {
//!         if let Some(assistant) = message?.as_assistant() {
//!             println!("{}", assistant.text());
//!         }
//!     }
//!
//!     match client.query_outcome(QueryRequest::new("Summarize README.md")?).await {
//!         Outcome::Success { messages, .. } => println!("{} messages", messages.len()),
//!         Outcome::Timeout { partial_messages, .. } => {
//!             println!("timed out after {} messages", partial_messages.len())
//!         }
//!         Outcome::Error { error, .. } => println!("failed: {error}"),
//!     }
//!
//!     client.close();
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod message_parser;
pub mod outcome;
pub mod query;
pub mod testing;

// Re-export commonly used types
pub use client::{ClaudeCodeClient, QueryTask};
pub use config::{ClientConfig, QueryRequest, QueryRequestBuilder};
pub use error::{AgentError, ErrorRecovery, Result};
pub use message_parser::{MessageParseError, parse_message, try_parse_message};
pub use outcome::Outcome;
pub use query::{MessageStream, Query};

pub use claudecode_protocol::{
    AssistantMessage, ContentBlock, McpServerConfig, Message, PermissionMode, QueryOptions,
    ResultMessage, SystemMessage, UserMessage,
};
pub use claudecode_transport::{ErrorKind, TransportError};
