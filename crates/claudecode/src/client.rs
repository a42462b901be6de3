//! Main client for the Claude Code SDK
//!
//! One client runs many queries; each query gets its own CLI process. The
//! client owns a cancellation scope shared by all of them, so [`close`]
//! stops every query still in flight.
//!
//! [`close`]: ClaudeCodeClient::close

use crate::config::{ClientConfig, QueryRequest};
use crate::error::{AgentError, Result};
use crate::outcome::Outcome;
use crate::query::{MessageStream, Query};
use claudecode_protocol::Message;
use claudecode_transport::{ProcessSpawner, TokioSpawner};
use futures::{StreamExt, TryStreamExt};
use pin_project::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for running queries against the Claude Code CLI
///
/// # Example
///
/// ```no_run
/// use claudecode::{ClaudeCodeClient, ClientConfig, QueryRequest};
///
/// # async fn run() -> claudecode::Result<()> {
/// let client = ClaudeCodeClient::new(ClientConfig::default())?;
/// let messages = client.query(QueryRequest::new("What is 2 + 2?")?).await?;
/// for message in &messages {
///     if let Some(assistant) = message.as_assistant() {
///         println!("{}", assistant.text());
///     }
/// }
/// client.close();
/// # Ok(())
/// # }
/// ```
pub struct ClaudeCodeClient {
    config: ClientConfig,
    spawner: Arc<dyn ProcessSpawner>,
    handle: Handle,
    scope: CancellationToken,
}

impl ClaudeCodeClient {
    /// Create a client bound to the current Tokio runtime
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when called outside a Tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            AgentError::Config(
                "ClaudeCodeClient must be created inside a Tokio runtime".to_string(),
            )
        })?;
        Ok(Self::with_handle(config, handle))
    }

    /// Create a client that runs async variants on `handle`
    pub fn with_handle(config: ClientConfig, handle: Handle) -> Self {
        Self {
            config,
            spawner: Arc::new(TokioSpawner),
            handle,
            scope: CancellationToken::new(),
        }
    }

    /// Replace the process factory used for every query
    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Stream messages as the CLI produces them
    ///
    /// The process starts on the first poll. Dropping the stream early kills it.
    pub fn query_stream(&self, request: QueryRequest) -> MessageStream {
        if self.is_closed() {
            return MessageStream::failed(AgentError::Cancelled);
        }
        let (prompt, options) = request.into_parts();
        let options = options.unwrap_or_else(|| self.config.default_options.clone());
        debug!(prompt_len = prompt.len(), model = ?options.model, "Starting query");

        Query::new(prompt, options)
            .with_cli_path(self.config.cli_path.clone())
            .with_spawner(Arc::clone(&self.spawner))
            .with_cancellation(self.scope.child_token())
            .stream()
    }

    /// Run a query to completion and return every message
    ///
    /// # Errors
    ///
    /// Returns the first failure unchanged; messages received before it are lost.
    /// Use [`query_outcome`](Self::query_outcome) to keep them.
    pub async fn query(&self, request: QueryRequest) -> Result<Vec<Message>> {
        self.query_stream(request).try_collect().await
    }

    /// Run a query to completion without failing
    pub async fn query_outcome(&self, request: QueryRequest) -> Outcome {
        Outcome::collect(self.query_stream(request)).await
    }

    /// Run a query, handing each message to `on_message` as it arrives
    ///
    /// # Errors
    ///
    /// Returns the first failure; messages before it have already been delivered.
    pub async fn query_with_callback<F>(&self, request: QueryRequest, on_message: F) -> Result<()>
    where
        F: FnMut(Message),
    {
        deliver(self.query_stream(request), on_message).await
    }

    /// Blocking form of [`query_with_callback`](Self::query_with_callback)
    ///
    /// Blocks the calling thread until the query ends. The client's runtime
    /// must be multi-threaded, since this thread does not drive it.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when called from inside an async context,
    /// otherwise the first query failure.
    pub fn query_with_callback_blocking<F>(
        &self,
        request: QueryRequest,
        on_message: F,
    ) -> Result<()>
    where
        F: FnMut(Message),
    {
        if Handle::try_current().is_ok() {
            return Err(AgentError::Config(
                "query_with_callback_blocking cannot be called from an async context".to_string(),
            ));
        }
        self.handle
            .block_on(deliver(self.query_stream(request), on_message))
    }

    /// Spawn [`query`](Self::query) on the client's runtime
    pub fn query_async(&self, request: QueryRequest) -> QueryTask<Vec<Message>> {
        let stream = self.query_stream(request);
        self.spawn(async move { stream.try_collect().await })
    }

    /// Spawn [`query_outcome`](Self::query_outcome) on the client's runtime
    pub fn query_outcome_async(&self, request: QueryRequest) -> QueryTask<Outcome> {
        let stream = self.query_stream(request);
        self.spawn(async move { Ok(Outcome::collect(stream).await) })
    }

    /// Spawn [`query_with_callback`](Self::query_with_callback) on the client's runtime
    pub fn query_with_callback_async<F>(
        &self,
        request: QueryRequest,
        on_message: F,
    ) -> QueryTask<()>
    where
        F: FnMut(Message) + Send + 'static,
    {
        let stream = self.query_stream(request);
        self.spawn(deliver(stream, on_message))
    }

    /// Cancel every in-flight query and refuse new ones
    ///
    /// Idempotent. Running queries end with [`AgentError::Cancelled`] after
    /// their processes are killed.
    pub fn close(&self) {
        if !self.scope.is_cancelled() {
            info!("Closing Claude Code client");
            self.scope.cancel();
        }
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    fn spawn<T, Fut>(&self, future: Fut) -> QueryTask<T>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        QueryTask {
            handle: self.handle.spawn(future),
        }
    }
}

impl Drop for ClaudeCodeClient {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

impl std::fmt::Debug for ClaudeCodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeCodeClient")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

async fn deliver<F>(mut stream: MessageStream, mut on_message: F) -> Result<()>
where
    F: FnMut(Message),
{
    while let Some(message) = stream.next().await {
        on_message(message?);
    }
    Ok(())
}

/// Handle to a query running on the client's runtime
///
/// Resolves to the query's result. Dropping the handle does not stop the
/// query; use [`abort`](Self::abort) or close the client.
#[pin_project]
#[derive(Debug)]
pub struct QueryTask<T> {
    #[pin]
    handle: JoinHandle<Result<T>>,
}

impl<T> QueryTask<T> {
    /// Abort the task, killing its process
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for QueryTask<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().handle.poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(AgentError::Cancelled),
            Err(e) => Err(AgentError::Task(e.to_string())),
        })
    }
}
