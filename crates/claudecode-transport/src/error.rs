//! Transport error types

use std::path::PathBuf;
use std::time::Duration;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Coarse classification of transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The CLI (or its runtime) could not be located
    NotFound,
    /// The process could not be started or its output could not be read
    Connection,
    /// A stdout line was not valid JSON
    Decode,
    /// The process exited with a non-zero status
    Process,
    /// The query deadline expired
    Timeout,
}

/// Errors that can occur in transport operations
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The CLI executable could not be located
    #[error("{message}")]
    NotFound {
        /// Human readable explanation with an install hint
        message: String,
        /// True when the JavaScript runtime itself is missing
        runtime_missing: bool,
    },

    /// The configured working directory does not exist
    #[error("Working directory does not exist: {}", .0.display())]
    WorkingDirectoryMissing(PathBuf),

    /// Spawning or talking to the process failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// A stdout line could not be decoded as JSON
    #[error("Failed to decode JSON from CLI output: {message} (line: {line})")]
    Decode {
        /// The offending line, as read
        line: String,
        /// Decoder message
        message: String,
    },

    /// The process exited unsuccessfully
    #[error(
        "Command failed with exit code {}{}",
        display_exit_code(.exit_code),
        display_stderr_tail(.stderr)
    )]
    Process {
        /// Exit code, absent when the process was terminated by a signal
        exit_code: Option<i32>,
        /// Captured stderr tail
        stderr: String,
    },

    /// The query deadline expired and the process was killed
    #[error("Query timed out after {}ms", .duration.as_millis())]
    Timeout {
        /// The configured deadline
        duration: Duration,
    },
}

/// Longest stderr excerpt shown in a `Process` error message
const STDERR_TAIL_BYTES: usize = 512;

fn display_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
}

/// `": <tail>"` with the last bytes of trimmed stderr, or nothing when empty
fn display_stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let mut start = trimmed.len().saturating_sub(STDERR_TAIL_BYTES);
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    let ellipsis = if start > 0 { "..." } else { "" };
    format!(": {ellipsis}{}", &trimmed[start..])
}

impl TransportError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::WorkingDirectoryMissing(_) | Self::Connection(_) => ErrorKind::Connection,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Process { .. } => ErrorKind::Process,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Captured stderr, for process failures
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Process { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            TransportError::WorkingDirectoryMissing("/nope".into()).kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            TransportError::Timeout {
                duration: Duration::from_millis(5)
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert!(
            TransportError::Timeout {
                duration: Duration::from_millis(5)
            }
            .is_timeout()
        );
    }

    #[test]
    fn test_process_error_display() {
        let err = TransportError::Process {
            exit_code: Some(1),
            stderr: "boom".into(),
        };
        assert_eq!(err.to_string(), "Command failed with exit code 1: boom");
        assert_eq!(err.stderr(), Some("boom"));

        let killed = TransportError::Process {
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "Command failed with exit code unknown");
    }

    #[test]
    fn test_process_error_display_keeps_stderr_tail() {
        let err = TransportError::Process {
            exit_code: Some(1),
            stderr: "\n  Error: Invalid API key · Please run /login\n\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "Command failed with exit code 1: Error: Invalid API key · Please run /login"
        );

        let noisy = format!("{}ééé{}", "x".repeat(2000), "y".repeat(509));
        let shown = TransportError::Process {
            exit_code: Some(2),
            stderr: noisy,
        }
        .to_string();
        assert!(shown.starts_with("Command failed with exit code 2: ..."));
        assert!(shown.ends_with(&"y".repeat(509)));
        assert!(!shown.contains('x'));
    }

    #[test]
    fn test_timeout_display() {
        let err = TransportError::Timeout {
            duration: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Query timed out after 1500ms");
    }
}
