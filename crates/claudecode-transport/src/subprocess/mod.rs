//! Subprocess transport for the Claude Code CLI
//!
//! One process per query: the prompt and options become the argument vector,
//! stdout is read as newline-delimited JSON, stderr is kept in a bounded
//! buffer for error reports.

pub mod cli;
pub mod command;
pub mod discovery;
pub mod process;
pub mod stderr;

pub use cli::{CliTransport, TransportState};
pub use command::build_args;
pub use discovery::CliLocator;
pub use process::{
    ProcessConfig, ProcessControl, ProcessSpawner, SpawnedProcess, TokioSpawner,
};
pub use stderr::StderrBuffer;
