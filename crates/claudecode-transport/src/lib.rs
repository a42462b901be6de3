//! Process transport for the Claude Code CLI
//!
//! Spawns the CLI in `stream-json` mode and exposes its stdout as a lazy,
//! deadline-bounded sequence of decoded JSON values.
//!
//! # Architecture
//!
//! - **Discovery**: explicit path, `PATH`, then well-known install locations
//! - **Command**: deterministic argument vector built from [`QueryOptions`]
//! - **Process seam**: [`ProcessSpawner`] so tests run without real processes
//! - **Error handling**: one [`TransportError`] with five kinds
//!
//! # Usage
//!
//! ```no_run
//! use claudecode_protocol::QueryOptions;
//! use claudecode_transport::CliTransport;
//!
//! # async fn run() -> claudecode_transport::Result<()> {
//! let mut transport = CliTransport::new("What is 2 + 2?", QueryOptions::default());
//! transport.connect().await?;
//! while let Some(value) = transport.recv_message().await? {
//!     println!("{value}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`QueryOptions`]: claudecode_protocol::QueryOptions

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod subprocess;
pub mod testing;

// Re-export commonly used types
pub use error::{ErrorKind, Result, TransportError};
pub use subprocess::{
    CliLocator, CliTransport, ProcessConfig, ProcessControl, ProcessSpawner, SpawnedProcess,
    TokioSpawner, TransportState,
};
