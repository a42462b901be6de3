//! Process management for the CLI subprocess
//!
//! Spawning goes through the [`ProcessSpawner`] seam so tests can substitute
//! scripted processes without touching the OS.

use super::discovery::CliLocator;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncRead;
use tokio::process::{Child as TokioChild, Command};

/// Environment variable identifying this SDK to the CLI
pub const ENTRYPOINT_ENV: &str = "CLAUDE_CODE_ENTRYPOINT";

/// Value of [`ENTRYPOINT_ENV`]
pub const ENTRYPOINT_VALUE: &str = "sdk-rust";

/// Configuration for spawning a CLI process
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessConfig {
    /// Path to the CLI executable
    pub cli_path: PathBuf,

    /// Arguments to pass to the CLI
    pub args: Vec<String>,

    /// Environment variables added on top of the inherited environment
    pub env: HashMap<String, String>,

    /// Working directory override
    pub cwd: Option<PathBuf>,
}

impl ProcessConfig {
    /// Create a new process configuration carrying the SDK entrypoint variable
    pub fn new(cli_path: impl Into<PathBuf>) -> Self {
        let mut env = HashMap::new();
        env.insert(ENTRYPOINT_ENV.to_string(), ENTRYPOINT_VALUE.to_string());
        Self {
            cli_path: cli_path.into(),
            args: Vec::new(),
            env,
            cwd: None,
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Replace the argument vector
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Set an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the working directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Build the tokio command for this configuration
    ///
    /// stdin is bound to null: the transport never writes to the child.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.cli_path);
        cmd.args(&self.args);
        cmd.envs(&self.env);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }
}

/// Boxed byte stream from a child process
pub type ChildOutput = Box<dyn AsyncRead + Send + Unpin>;

/// Control half of a running process
#[async_trait]
pub trait ProcessControl: Send {
    /// OS process id, if known
    fn id(&self) -> Option<u32>;

    /// Poll for exit without blocking
    ///
    /// `Ok(None)` while running; `Ok(Some(code))` once exited, where `code` is
    /// absent for signal terminations.
    fn try_wait(&mut self) -> io::Result<Option<Option<i32>>>;

    /// Wait for the process to exit and return its exit code
    async fn wait(&mut self) -> io::Result<Option<i32>>;

    /// Send a kill signal without waiting
    fn start_kill(&mut self) -> io::Result<()>;
}

/// A freshly spawned process with its output pipes detached
pub struct SpawnedProcess {
    /// Control handle
    pub control: Box<dyn ProcessControl>,
    /// stdout pipe
    pub stdout: ChildOutput,
    /// stderr pipe
    pub stderr: ChildOutput,
}

impl SpawnedProcess {
    /// Take the pipes out of a tokio child
    pub fn from_child(mut child: TokioChild) -> io::Result<Self> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("Failed to get stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("Failed to get stderr"))?;
        Ok(Self {
            control: Box::new(TokioProcess { child }),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        })
    }
}

/// Factory for CLI processes
pub trait ProcessSpawner: Send + Sync {
    /// Resolve the executable to launch
    ///
    /// Spawners that never start real programs may skip discovery.
    fn resolve(&self, locator: &CliLocator, explicit: Option<&Path>) -> Result<PathBuf> {
        locator.locate(explicit)
    }

    /// Start a process for `config`
    fn spawn(&self, config: &ProcessConfig) -> io::Result<SpawnedProcess>;
}

/// Spawner backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, config: &ProcessConfig) -> io::Result<SpawnedProcess> {
        SpawnedProcess::from_child(config.command().spawn()?)
    }
}

struct TokioProcess {
    child: TokioChild,
}

#[async_trait]
impl ProcessControl for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<Option<i32>>> {
        Ok(self.child.try_wait()?.map(|status| status.code()))
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.wait().await?.code())
    }

    fn start_kill(&mut self) -> io::Result<()> {
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            // Already reaped
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e),
        }
    }
}
