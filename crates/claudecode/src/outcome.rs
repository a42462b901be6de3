//! Non-throwing query results

use crate::error::{AgentError, Result};
use crate::query::MessageStream;
use claudecode_protocol::Message;
use futures::StreamExt;
use std::time::Instant;

/// Terminal result of one query attempt
///
/// Every variant keeps the messages received before the query ended, so a
/// failed or timed-out query still exposes its partial output. The messages
/// live only in the outcome; `T` is an extra value derived with [`map`](Self::map).
#[derive(Debug)]
pub enum Outcome<T = ()> {
    /// The query completed
    Success {
        /// Value produced from the messages
        value: T,
        /// Every message received
        messages: Vec<Message>,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },

    /// The query failed for a reason other than its deadline
    Error {
        /// The failure
        error: AgentError,
        /// Messages received before the failure
        partial_messages: Vec<Message>,
        /// Wall-clock duration of the attempt
        duration_ms: u64,
    },

    /// The query deadline expired
    Timeout {
        /// Wall-clock duration of the attempt
        duration_ms: u64,
        /// Messages received before the deadline
        partial_messages: Vec<Message>,
    },
}

impl Outcome {
    /// Drain `stream`, converting its terminal event into an outcome
    pub async fn collect(mut stream: MessageStream) -> Self {
        let started = Instant::now();
        let mut messages = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(message) => messages.push(message),
                Err(error) => {
                    return Self::from_failure(error, messages, elapsed_ms(started));
                }
            }
        }
        Self::Success {
            value: (),
            messages,
            duration_ms: elapsed_ms(started),
        }
    }
}

impl<T> Outcome<T> {
    /// Classify a failure: timeouts become [`Outcome::Timeout`], the rest [`Outcome::Error`]
    pub fn from_failure(
        error: AgentError,
        partial_messages: Vec<Message>,
        duration_ms: u64,
    ) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                duration_ms,
                partial_messages,
            }
        } else {
            Self::Error {
                error,
                partial_messages,
                duration_ms,
            }
        }
    }

    /// Check if the query completed
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Check if the query deadline expired
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// All messages on success, the partial list otherwise
    pub fn messages(&self) -> &[Message] {
        match self {
            Self::Success { messages, .. } => messages,
            Self::Error {
                partial_messages, ..
            }
            | Self::Timeout {
                partial_messages, ..
            } => partial_messages,
        }
    }

    /// Take the messages out: all of them on success, the partial list otherwise
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Success { messages, .. } => messages,
            Self::Error {
                partial_messages, ..
            }
            | Self::Timeout {
                partial_messages, ..
            } => partial_messages,
        }
    }

    /// Wall-clock duration of the attempt
    pub fn duration_ms(&self) -> u64 {
        match self {
            Self::Success { duration_ms, .. }
            | Self::Error { duration_ms, .. }
            | Self::Timeout { duration_ms, .. } => *duration_ms,
        }
    }

    /// The failure, for [`Outcome::Error`]
    pub fn error(&self) -> Option<&AgentError> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Convert back into a `Result`, dropping partial messages
    ///
    /// A timeout becomes [`TransportError::Timeout`](claudecode_transport::TransportError::Timeout)
    /// carrying the measured duration.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Error { error, .. } => Err(error),
            Self::Timeout { duration_ms, .. } => Err(AgentError::from(
                claudecode_transport::TransportError::Timeout {
                    duration: std::time::Duration::from_millis(duration_ms),
                },
            )),
        }
    }

    /// Transform the success value
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Success {
                value,
                messages,
                duration_ms,
            } => Outcome::Success {
                value: f(value),
                messages,
                duration_ms,
            },
            Self::Error {
                error,
                partial_messages,
                duration_ms,
            } => Outcome::Error {
                error,
                partial_messages,
                duration_ms,
            },
            Self::Timeout {
                duration_ms,
                partial_messages,
            } => Outcome::Timeout {
                duration_ms,
                partial_messages,
            },
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudecode_protocol::UserMessage;
    use claudecode_transport::TransportError;
    use std::time::Duration;

    fn user(text: &str) -> Message {
        Message::User(UserMessage::new(text))
    }

    #[test]
    fn test_timeout_failure_becomes_timeout() {
        let error = AgentError::from(TransportError::Timeout {
            duration: Duration::from_millis(50),
        });
        let outcome: Outcome<()> = Outcome::from_failure(error, vec![user("a"), user("b")], 51);
        assert!(outcome.is_timeout());
        assert_eq!(outcome.messages().len(), 2);
        assert_eq!(outcome.duration_ms(), 51);
    }

    #[test]
    fn test_other_failure_becomes_error() {
        let outcome: Outcome<()> =
            Outcome::from_failure(AgentError::Config("bad".into()), vec![user("a")], 3);
        assert!(!outcome.is_success());
        assert!(matches!(outcome.error(), Some(AgentError::Config(_))));
        assert_eq!(outcome.messages(), &[user("a")]);
    }

    #[test]
    fn test_map_and_into_result() {
        let outcome = Outcome::Success {
            value: vec![user("x")],
            messages: vec![user("x")],
            duration_ms: 7,
        };
        let counted = outcome.map(|messages| messages.len());
        assert!(counted.is_success());
        assert_eq!(counted.messages().len(), 1);
        assert_eq!(counted.into_result().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_collect_keeps_single_message_list() {
        let stream = MessageStream::from_messages(vec![user("a"), user("b")]);
        let outcome = Outcome::collect(stream).await;
        assert!(matches!(outcome, Outcome::Success { value: (), .. }));
        assert_eq!(outcome.messages().len(), 2);
        assert_eq!(outcome.into_messages(), vec![user("a"), user("b")]);
    }

    #[tokio::test]
    async fn test_collect_failure_keeps_partial_messages() {
        let stream = MessageStream::failed(AgentError::Cancelled);
        let outcome = Outcome::collect(stream).await;
        assert!(outcome.error().unwrap().is_cancelled());
        assert!(outcome.into_messages().is_empty());
    }

    #[test]
    fn test_timeout_into_result_is_timeout_error() {
        let outcome: Outcome<()> = Outcome::Timeout {
            duration_ms: 1000,
            partial_messages: Vec::new(),
        };
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_timeout());
    }
}
