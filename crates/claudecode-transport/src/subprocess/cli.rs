//! CLI transport implementation
//!
//! Runs one Claude Code CLI process per query and turns its stdout into a
//! sequence of decoded JSON values. stderr is drained into a bounded buffer
//! by a background task for the whole life of the process.

use super::command::build_args;
use super::discovery::CliLocator;
use super::process::{ChildOutput, ProcessConfig, ProcessControl, ProcessSpawner, TokioSpawner};
use super::stderr::{DEFAULT_STDERR_CAPACITY, SharedStderr, StderrBuffer, drain_stderr};
use crate::error::{Result, TransportError};
use claudecode_protocol::QueryOptions;
use futures::Stream;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How long to wait for a killed process to be reaped
const KILL_GRACE: Duration = Duration::from_secs(2);

/// How long to wait for stderr to flush after the process exits
const STDERR_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle state of a [`CliTransport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Created, no process yet
    Disconnected,
    /// Process spawned, nothing read yet
    Connected,
    /// At least one stdout read completed
    Streaming,
    /// Process gone and handles released; the transport cannot be reused
    Closed,
}

struct Session {
    control: Box<dyn ProcessControl>,
    stdout: BufReader<ChildOutput>,
    stderr: SharedStderr,
    stderr_task: Option<JoinHandle<()>>,
    deadline: Instant,
}

/// CLI transport for a single query
///
/// The transport owns at most one process and is never reused: once the
/// stream terminates or [`disconnect`](Self::disconnect) is called it is
/// closed for good.
pub struct CliTransport {
    prompt: String,
    options: QueryOptions,
    cli_path: Option<PathBuf>,
    locator: CliLocator,
    spawner: Arc<dyn ProcessSpawner>,
    stderr_capacity: usize,
    cancel: CancellationToken,
    state: TransportState,
    session: Option<Session>,
}

impl CliTransport {
    /// Create a transport for `prompt` with a snapshot of `options`
    pub fn new(prompt: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            cli_path: None,
            locator: CliLocator::default(),
            spawner: Arc::new(TokioSpawner),
            stderr_capacity: DEFAULT_STDERR_CAPACITY,
            cancel: CancellationToken::new(),
            state: TransportState::Disconnected,
            session: None,
        }
    }

    /// Use an explicit CLI executable instead of discovery
    pub fn with_cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_path = Some(path.into());
        self
    }

    /// Replace the process factory
    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Replace the executable locator
    pub fn with_locator(mut self, locator: CliLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Cap the captured stderr
    pub fn with_stderr_capacity(mut self, capacity: usize) -> Self {
        self.stderr_capacity = capacity;
        self
    }

    /// Run the background stderr task under `parent`
    ///
    /// Cancelling `parent` stops the drain; the transport also cancels its own
    /// scope on disconnect.
    pub fn with_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.cancel = parent.child_token();
        self
    }

    /// The prompt this transport sends
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The options snapshot this transport was built with
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Current lifecycle state
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Arguments the CLI is invoked with
    pub fn args(&self) -> Vec<String> {
        build_args(&self.prompt, &self.options)
    }

    /// Start the CLI process
    ///
    /// Calling this on a connected transport is a no-op.
    ///
    /// # Errors
    ///
    /// - [`TransportError::WorkingDirectoryMissing`] if the `cwd` option names
    ///   a directory that does not exist
    /// - [`TransportError::NotFound`] if the executable cannot be resolved
    /// - [`TransportError::Connection`] for any other start failure, including
    ///   connecting a transport that was already closed
    pub async fn connect(&mut self) -> Result<()> {
        match self.state {
            TransportState::Connected | TransportState::Streaming => return Ok(()),
            TransportState::Closed => {
                return Err(TransportError::Connection(
                    "Transport is closed and cannot be reconnected".to_string(),
                ));
            }
            TransportState::Disconnected => {}
        }

        if let Some(cwd) = &self.options.cwd
            && !cwd.is_dir()
        {
            return Err(TransportError::WorkingDirectoryMissing(cwd.clone()));
        }

        let cli_path = self
            .spawner
            .resolve(&self.locator, self.cli_path.as_deref())?;
        let mut config = ProcessConfig::new(&cli_path).with_args(self.args());
        if let Some(cwd) = &self.options.cwd {
            config = config.with_cwd(cwd);
        }

        let process = self
            .spawner
            .spawn(&config)
            .map_err(|e| spawn_error(&cli_path, e))?;
        let pid = process.control.id();

        let stderr: SharedStderr = Arc::new(Mutex::new(StderrBuffer::new(self.stderr_capacity)));
        let stderr_task = tokio::spawn(drain_stderr(
            process.stderr,
            Arc::clone(&stderr),
            self.cancel.child_token(),
        ));

        let now = Instant::now();
        let deadline = now
            .checked_add(self.options.timeout)
            .unwrap_or_else(|| now + Duration::from_secs(u32::MAX.into()));

        info!(
            pid = ?pid,
            cli_path = %cli_path.display(),
            args = config.args.len(),
            timeout_ms = self.options.timeout.as_millis() as u64,
            "Spawned Claude Code CLI"
        );

        self.session = Some(Session {
            control: process.control,
            stdout: BufReader::new(process.stdout),
            stderr,
            stderr_task: Some(stderr_task),
            deadline,
        });
        self.state = TransportState::Connected;
        Ok(())
    }

    /// Read the next JSON value from stdout
    ///
    /// Returns `Ok(None)` once the process has exited cleanly. Any error is
    /// terminal: the process is killed, the transport closed, and later calls
    /// return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Decode`] for a line that is not valid JSON
    /// - [`TransportError::Process`] when the process exits non-zero
    /// - [`TransportError::Timeout`] when the query deadline expires
    /// - [`TransportError::Connection`] if the transport was never connected
    ///   or stdout cannot be read
    pub async fn recv_message(&mut self) -> Result<Option<Value>> {
        loop {
            let (read, line) = {
                let Some(session) = self.session.as_mut() else {
                    return match self.state {
                        TransportState::Closed => Ok(None),
                        _ => Err(TransportError::Connection(
                            "Transport is not connected".to_string(),
                        )),
                    };
                };
                let mut line = Vec::new();
                let read = timeout_at(
                    session.deadline,
                    session.stdout.read_until(b'\n', &mut line),
                )
                .await;
                (read, line)
            };
            self.state = TransportState::Streaming;

            match read {
                Err(_) => return Err(self.time_out().await),
                Ok(Err(e)) => {
                    self.disconnect().await;
                    return Err(TransportError::Connection(format!(
                        "Failed to read from CLI stdout: {e}"
                    )));
                }
                Ok(Ok(0)) => return self.finish().await.map(|()| None),
                Ok(Ok(_)) => {}
            }

            let text = match String::from_utf8(line) {
                Ok(text) => text,
                Err(e) => {
                    let line = String::from_utf8_lossy(e.as_bytes()).into_owned();
                    self.disconnect().await;
                    return Err(TransportError::Decode {
                        line,
                        message: format!("invalid UTF-8: {}", e.utf8_error()),
                    });
                }
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            return match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    warn!(error = %e, "Undecodable line on CLI stdout");
                    self.disconnect().await;
                    Err(TransportError::Decode {
                        line: trimmed.to_string(),
                        message: e.to_string(),
                    })
                }
            };
        }
    }

    /// Lazy sequence of decoded JSON values from stdout
    ///
    /// Single pass: the stream ends after clean exit or after yielding the
    /// first error.
    pub fn receive_messages(&mut self) -> impl Stream<Item = Result<Value>> + '_ {
        futures::stream::unfold((self, false), |(transport, done)| async move {
            if done {
                return None;
            }
            match transport.recv_message().await {
                Ok(Some(value)) => Some((Ok(value), (transport, false))),
                Ok(None) => None,
                Err(e) => Some((Err(e), (transport, true))),
            }
        })
    }

    /// Whether a live process is attached
    pub fn is_connected(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => matches!(session.control.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Stop the process and release every handle
    ///
    /// Idempotent; safe to call on any path, any number of times.
    pub async fn disconnect(&mut self) {
        self.cancel.cancel();
        if let Some(mut session) = self.session.take() {
            if matches!(session.control.try_wait(), Ok(None)) {
                warn!(pid = ?session.control.id(), "Killing Claude Code CLI");
                if let Err(e) = session.control.start_kill() {
                    warn!(error = %e, "Failed to kill CLI process");
                }
                if timeout(KILL_GRACE, session.control.wait()).await.is_err() {
                    warn!("CLI process did not exit after kill");
                }
            }
            if let Some(task) = session.stderr_task.take() {
                task.abort();
            }
            debug!("CLI transport disconnected");
        }
        self.state = TransportState::Closed;
    }

    async fn time_out(&mut self) -> TransportError {
        let duration = self.options.timeout;
        warn!(
            timeout_ms = duration.as_millis() as u64,
            "Query deadline expired, terminating CLI"
        );
        self.disconnect().await;
        TransportError::Timeout { duration }
    }

    /// Stdout reached EOF: collect the exit status and close
    async fn finish(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let waited = timeout_at(session.deadline, session.control.wait()).await;
        let Ok(exit) = waited else {
            return Err(self.time_out().await);
        };
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let result = match exit {
            Ok(Some(0)) => {
                debug!("CLI exited cleanly");
                Ok(())
            }
            Ok(exit_code) => {
                if let Some(task) = session.stderr_task.as_mut() {
                    let grace = (Instant::now() + STDERR_GRACE).min(session.deadline);
                    if timeout_at(grace, task).await.is_ok() {
                        session.stderr_task = None;
                    }
                }
                let stderr = session.stderr.lock().await.contents();
                warn!(exit_code = ?exit_code, stderr_len = stderr.len(), "CLI exited with failure");
                Err(TransportError::Process { exit_code, stderr })
            }
            Err(e) => Err(TransportError::Connection(format!(
                "Failed to wait for CLI process: {e}"
            ))),
        };

        self.disconnect().await;
        result
    }
}

impl Drop for CliTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.session.as_mut() {
            if matches!(session.control.try_wait(), Ok(None)) {
                debug!("Transport dropped with live process, killing");
                let _ = session.control.start_kill();
            }
            if let Some(task) = session.stderr_task.take() {
                task.abort();
            }
        }
    }
}

impl std::fmt::Debug for CliTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliTransport")
            .field("prompt", &self.prompt)
            .field("cli_path", &self.cli_path)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn spawn_error(cli_path: &Path, error: io::Error) -> TransportError {
    match error.kind() {
        io::ErrorKind::NotFound => TransportError::NotFound {
            message: format!("Claude Code not found at: {}", cli_path.display()),
            runtime_missing: false,
        },
        _ => TransportError::Connection(format!("Failed to start Claude Code: {error}")),
    }
}
