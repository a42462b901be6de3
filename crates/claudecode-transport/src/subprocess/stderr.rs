//! Bounded capture of the CLI's stderr
//!
//! stderr is drained continuously so a chatty child can never block on a
//! full pipe. Only the most recent bytes are kept.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default stderr capture cap (1 MiB)
pub const DEFAULT_STDERR_CAPACITY: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Ring buffer that keeps the newest `capacity` bytes
#[derive(Debug, Clone)]
pub struct StderrBuffer {
    bytes: VecDeque<u8>,
    capacity: usize,
    evicted: usize,
}

impl StderrBuffer {
    /// Create a buffer holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: VecDeque::with_capacity(capacity.min(READ_CHUNK)),
            capacity,
            evicted: 0,
        }
    }

    /// Append bytes, evicting the oldest past the cap
    pub fn push(&mut self, chunk: &[u8]) {
        if self.capacity == 0 {
            self.evicted += chunk.len();
            return;
        }
        let chunk = if chunk.len() > self.capacity {
            let skipped = chunk.len() - self.capacity;
            self.evicted += skipped;
            &chunk[skipped..]
        } else {
            chunk
        };
        let overflow = (self.bytes.len() + chunk.len()).saturating_sub(self.capacity);
        if overflow > 0 {
            self.bytes.drain(..overflow);
            self.evicted += overflow;
        }
        self.bytes.extend(chunk);
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes dropped to honour the cap
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Captured content as text; invalid UTF-8 is replaced
    pub fn contents(&self) -> String {
        let (head, tail) = self.bytes.as_slices();
        let mut joined = Vec::with_capacity(head.len() + tail.len());
        joined.extend_from_slice(head);
        joined.extend_from_slice(tail);
        String::from_utf8_lossy(&joined).into_owned()
    }
}

impl Default for StderrBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_STDERR_CAPACITY)
    }
}

/// Shared handle to a buffer being filled by a drain task
pub type SharedStderr = Arc<Mutex<StderrBuffer>>;

/// Drain `reader` into `buffer` until EOF, a read error, or cancellation
pub(crate) async fn drain_stderr<R>(mut reader: R, buffer: SharedStderr, cancel: CancellationToken)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break,
            read = reader.read(&mut chunk) => read,
        };
        match read {
            Ok(0) => break,
            Ok(n) => {
                debug!(
                    target: "claudecode::stderr",
                    "{}",
                    String::from_utf8_lossy(&chunk[..n]).trim_end()
                );
                buffer.lock().await.push(&chunk[..n]);
            }
            Err(e) => {
                debug!(error = %e, "stderr read failed, stopping drain");
                break;
            }
        }
    }
}
