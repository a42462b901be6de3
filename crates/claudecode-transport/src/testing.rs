//! In-memory process doubles
//!
//! [`ScriptedSpawner`] implements [`ProcessSpawner`] without touching the OS:
//! each spawn replays a [`ScriptedProcess`] and records what happened to it.

use crate::error::Result;
use crate::subprocess::discovery::CliLocator;
use crate::subprocess::process::{ProcessConfig, ProcessControl, ProcessSpawner, SpawnedProcess};
use async_trait::async_trait;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, DuplexStream};

/// Script for one fake CLI process
#[derive(Debug, Clone, Default)]
pub struct ScriptedProcess {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    exit_code: i32,
    hang: bool,
    spawn_error: Option<io::ErrorKind>,
}

impl ScriptedProcess {
    /// A process that prints nothing and exits 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one stdout line; the newline is added
    pub fn with_line(mut self, line: impl AsRef<str>) -> Self {
        self.stdout.extend_from_slice(line.as_ref().as_bytes());
        self.stdout.push(b'\n');
        self
    }

    /// Append several stdout lines
    pub fn with_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines.into_iter().fold(self, Self::with_line)
    }

    /// Append stdout bytes verbatim
    pub fn with_raw_stdout(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.stdout.extend_from_slice(bytes.as_ref());
        self
    }

    /// Set the stderr output
    pub fn with_stderr(mut self, text: impl AsRef<str>) -> Self {
        self.stderr = text.as_ref().as_bytes().to_vec();
        self
    }

    /// Set the exit code reported once stdout is drained
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Keep stdout open after the scripted output until killed
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Make spawning fail with `kind`
    pub fn failing_to_spawn(mut self, kind: io::ErrorKind) -> Self {
        self.spawn_error = Some(kind);
        self
    }
}

/// Spawner replaying a [`ScriptedProcess`]
///
/// Clones share their records, so a test can keep one clone and hand another
/// to the code under test.
#[derive(Debug, Clone)]
pub struct ScriptedSpawner {
    script: ScriptedProcess,
    killed: Arc<AtomicBool>,
    spawned: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<ProcessConfig>>>,
}

impl ScriptedSpawner {
    /// Create a spawner for `script`
    pub fn new(script: ScriptedProcess) -> Self {
        Self {
            script,
            killed: Arc::new(AtomicBool::new(false)),
            spawned: Arc::new(AtomicUsize::new(0)),
            last_config: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether any spawned process was killed
    pub fn was_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    /// Number of processes spawned
    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Configuration of the most recent spawn
    pub fn last_config(&self) -> Option<ProcessConfig> {
        self.last_config
            .lock()
            .ok()
            .and_then(|config| config.clone())
    }
}

impl ProcessSpawner for ScriptedSpawner {
    fn resolve(&self, _locator: &CliLocator, explicit: Option<&Path>) -> Result<PathBuf> {
        Ok(explicit.map_or_else(|| PathBuf::from("claude"), Path::to_path_buf))
    }

    fn spawn(&self, config: &ProcessConfig) -> io::Result<SpawnedProcess> {
        if let Ok(mut last) = self.last_config.lock() {
            *last = Some(config.clone());
        }
        if let Some(kind) = self.script.spawn_error {
            return Err(io::Error::from(kind));
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);

        // A hanging script keeps the write half until kill, so stdout blocks like a live pipe
        let (writer, reader) = tokio::io::duplex(64);
        let stdout = Cursor::new(self.script.stdout.clone()).chain(reader);
        let writer = self.script.hang.then_some(writer);

        Ok(SpawnedProcess {
            control: Box::new(ScriptedControl {
                exit_code: self.script.exit_code,
                hang: self.script.hang,
                exited: false,
                _stdout_writer: writer,
                killed: Arc::clone(&self.killed),
            }),
            stdout: Box::new(stdout),
            stderr: Box::new(Cursor::new(self.script.stderr.clone())),
        })
    }
}

struct ScriptedControl {
    exit_code: i32,
    hang: bool,
    exited: bool,
    _stdout_writer: Option<DuplexStream>,
    killed: Arc<AtomicBool>,
}

impl ScriptedControl {
    fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessControl for ScriptedControl {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> io::Result<Option<Option<i32>>> {
        if self.killed() {
            return Ok(Some(None));
        }
        Ok(self.exited.then_some(Some(self.exit_code)))
    }

    async fn wait(&mut self) -> io::Result<Option<i32>> {
        if self.killed() {
            return Ok(None);
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.exited = true;
        Ok(Some(self.exit_code))
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        self._stdout_writer = None;
        Ok(())
    }
}
