//! Error types for the Claude Code SDK
//!
//! Every failure a caller can see is an [`AgentError`]. Transport failures
//! pass through unchanged inside [`AgentError::Transport`]; the remaining
//! variants cover configuration mistakes and client shutdown.
//!
//! Errors implement [`ErrorRecovery`], which answers two questions:
//! - Retriability (is running the same query again likely to help?)
//! - Suggested user action (what should the user fix?)

use claudecode_transport::{ErrorKind, TransportError};

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error recovery guidance trait
pub trait ErrorRecovery {
    /// Whether the same query may succeed if run again
    fn is_retriable(&self) -> bool;

    /// User-facing action to take
    fn suggested_action(&self) -> &'static str;
}

/// Errors that can occur in SDK operations
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Process transport failure: not found, connection, decode, process exit or timeout
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Invalid request or client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client was closed while the query was pending or running
    #[error("Query cancelled: client is closed")]
    Cancelled,

    /// A spawned query task failed before producing a result
    #[error("Query task failed: {0}")]
    Task(String),
}

impl AgentError {
    /// Check if this is a query timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if this error comes from client shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Transport classification, for transport failures
    pub fn kind(&self) -> Option<ErrorKind> {
        self.transport().map(TransportError::kind)
    }

    /// The underlying transport failure, if any
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl ErrorRecovery for AgentError {
    fn is_retriable(&self) -> bool {
        match self {
            // A fresh process may well succeed
            Self::Transport(TransportError::Timeout { .. })
            | Self::Transport(TransportError::Connection(_)) => true,

            // Installation, cwd, and CLI-reported failures need user action
            Self::Transport(_) => false,

            Self::Config(_) | Self::Cancelled => false,

            // Panicked tasks are bugs, not transient conditions
            Self::Task(_) => false,
        }
    }

    fn suggested_action(&self) -> &'static str {
        match self {
            Self::Transport(TransportError::NotFound {
                runtime_missing: true,
                ..
            }) => "Install Node.js, then run: npm install -g @anthropic-ai/claude-code",
            Self::Transport(TransportError::NotFound { .. }) => {
                "Install Claude Code with npm install -g @anthropic-ai/claude-code \
                or pass the executable path explicitly."
            }
            Self::Transport(TransportError::WorkingDirectoryMissing(_)) => {
                "Create the working directory or fix the cwd option."
            }
            Self::Transport(TransportError::Connection(_)) => {
                "The CLI could not be started or read. Check the executable \
                and try again."
            }
            Self::Transport(TransportError::Decode { .. }) => {
                "The CLI printed output that is not JSON. Check that the installed \
                Claude Code version supports --output-format stream-json."
            }
            Self::Transport(TransportError::Process { .. }) => {
                "The CLI exited with an error. Inspect the captured stderr for details."
            }
            Self::Transport(TransportError::Timeout { .. }) => {
                "Query timed out. Raise the timeout option or simplify the query."
            }
            Self::Config(_) => "Fix the request or client configuration and try again.",
            Self::Cancelled => "Create a new client; a closed client accepts no queries.",
            Self::Task(_) => "A query task panicked. Check logs for the panic message.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_error_passes_through() {
        let err: AgentError = TransportError::Process {
            exit_code: Some(2),
            stderr: "bad flag".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Command failed with exit code 2: bad flag");
        assert_eq!(err.kind(), Some(ErrorKind::Process));
        assert_eq!(err.transport().and_then(TransportError::stderr), Some("bad flag"));
    }

    #[test]
    fn test_timeout_detection() {
        let err = AgentError::from(TransportError::Timeout {
            duration: Duration::from_secs(1),
        });
        assert!(err.is_timeout());
        assert!(err.is_retriable());
        assert!(!AgentError::Cancelled.is_timeout());
        assert!(AgentError::Cancelled.is_cancelled());
    }

    #[test]
    fn test_retriable_classification() {
        assert!(AgentError::from(TransportError::Connection("reset".into())).is_retriable());
        assert!(
            !AgentError::from(TransportError::NotFound {
                message: "missing".into(),
                runtime_missing: false,
            })
            .is_retriable()
        );
        assert!(!AgentError::Config("empty prompt".into()).is_retriable());
        assert!(!AgentError::Cancelled.is_retriable());
    }

    #[test]
    fn test_suggested_actions() {
        let runtime = AgentError::from(TransportError::NotFound {
            message: String::new(),
            runtime_missing: true,
        });
        assert!(runtime.suggested_action().contains("Node.js"));

        let timeout = AgentError::from(TransportError::Timeout {
            duration: Duration::from_secs(1),
        });
        assert!(timeout.suggested_action().contains("timeout"));

        let process = AgentError::from(TransportError::Process {
            exit_code: Some(1),
            stderr: String::new(),
        });
        assert!(process.suggested_action().contains("stderr"));
    }

    #[test]
    fn test_kind_absent_for_sdk_errors() {
        assert_eq!(AgentError::Cancelled.kind(), None);
        assert_eq!(AgentError::Task("panic".into()).kind(), None);
    }
}
