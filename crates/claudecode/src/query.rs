//! Query orchestration
//!
//! A [`Query`] wires one [`CliTransport`] to the message parser and exposes
//! the result as a lazy [`MessageStream`]. Nothing happens until the stream
//! is first polled; the transport is disconnected exactly once, whichever way
//! the stream ends.

use crate::error::{AgentError, Result};
use crate::message_parser::try_parse_message;
use claudecode_protocol::{Message, QueryOptions};
use claudecode_transport::{CliTransport, ProcessSpawner};
use futures::Stream;
use futures::stream::BoxStream;
use pin_project::pin_project;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// A single query against the CLI
#[derive(Clone)]
pub struct Query {
    prompt: String,
    options: QueryOptions,
    cli_path: Option<PathBuf>,
    spawner: Option<Arc<dyn ProcessSpawner>>,
    cancel: CancellationToken,
}

impl Query {
    /// Create a query for `prompt` with its own copy of `options`
    pub fn new(prompt: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            cli_path: None,
            spawner: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an explicit CLI executable
    pub fn with_cli_path(mut self, path: Option<PathBuf>) -> Self {
        self.cli_path = path;
        self
    }

    /// Replace the process factory
    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Run under `token`; cancelling it ends the stream with [`AgentError::Cancelled`]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Start streaming messages
    pub fn stream(self) -> MessageStream {
        let mut transport =
            CliTransport::new(self.prompt, self.options).with_cancellation(&self.cancel);
        if let Some(path) = self.cli_path {
            transport = transport.with_cli_path(path);
        }
        if let Some(spawner) = self.spawner {
            transport = transport.with_spawner(spawner);
        }

        let state = QueryState {
            transport: Some(transport),
            connected: false,
            cancel: self.cancel,
            emitted: 0,
            started: Instant::now(),
        };
        let inner = futures::stream::unfold(state, |mut state| async move {
            let item = state.next().await?;
            Some((item, state))
        });
        MessageStream {
            inner: Box::pin(inner),
        }
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("prompt", &self.prompt)
            .field("options", &self.options)
            .field("cli_path", &self.cli_path)
            .finish_non_exhaustive()
    }
}

struct QueryState {
    transport: Option<CliTransport>,
    connected: bool,
    cancel: CancellationToken,
    emitted: usize,
    started: Instant,
}

impl QueryState {
    async fn next(&mut self) -> Option<Result<Message>> {
        loop {
            let transport = self.transport.as_mut()?;

            if !self.connected {
                let connected = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Err(AgentError::Cancelled),
                    result = transport.connect() => result.map_err(AgentError::from),
                };
                if let Err(e) = connected {
                    return Some(Err(self.fail(e).await));
                }
                self.connected = true;
            }

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(AgentError::Cancelled),
                result = transport.recv_message() => result.map_err(AgentError::from),
            };

            match next {
                Ok(Some(value)) => match try_parse_message(&value) {
                    Ok(message) => {
                        self.emitted += 1;
                        return Some(Ok(message));
                    }
                    Err(reason) => {
                        debug!(reason = %reason, "Dropping unparseable message");
                    }
                },
                Ok(None) => {
                    info!(
                        messages = self.emitted,
                        duration_ms = self.started.elapsed().as_millis() as u64,
                        "Query completed"
                    );
                    self.close().await;
                    return None;
                }
                Err(e) => return Some(Err(self.fail(e).await)),
            }
        }
    }

    async fn fail(&mut self, error: AgentError) -> AgentError {
        debug!(error = %error, messages = self.emitted, "Query failed");
        self.close().await;
        error
    }

    async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.disconnect().await;
        }
    }
}

/// Lazy, single-pass stream of messages for one query
///
/// Ends after the final message, or after yielding the first error. Dropping
/// the stream early kills the CLI process.
#[pin_project]
pub struct MessageStream {
    #[pin]
    inner: BoxStream<'static, Result<Message>>,
}

impl MessageStream {
    /// A stream that yields `error` once, without starting a process
    pub(crate) fn failed(error: AgentError) -> Self {
        Self {
            inner: Box::pin(futures::stream::once(async move { Err(error) })),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_messages(messages: Vec<Message>) -> Self {
        Self {
            inner: Box::pin(futures::stream::iter(messages.into_iter().map(Ok))),
        }
    }
}

impl Stream for MessageStream {
    type Item = Result<Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl std::fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStream").finish_non_exhaustive()
    }
}
