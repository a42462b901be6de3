//! Client and request configuration

use crate::error::{AgentError, Result};
use claudecode_protocol::QueryOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the CLI executable
pub const CLI_PATH_ENV: &str = "CLAUDE_CODE_CLI_PATH";

/// Environment variable overriding the default query timeout, in milliseconds
pub const TIMEOUT_ENV: &str = "CLAUDE_CODE_TIMEOUT_MS";

/// Configuration for [`ClaudeCodeClient`](crate::ClaudeCodeClient)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientConfig {
    /// Explicit CLI executable; discovered when absent
    pub cli_path: Option<PathBuf>,

    /// Options used by requests that carry none
    pub default_options: QueryOptions,
}

impl ClientConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// Reads [`CLI_PATH_ENV`] and [`TIMEOUT_ENV`]; unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the timeout is not a whole number of
    /// milliseconds.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = std::env::var_os(CLI_PATH_ENV).filter(|p| !p.is_empty()) {
            config.cli_path = Some(PathBuf::from(path));
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                AgentError::Config(format!("{TIMEOUT_ENV} must be milliseconds, got {raw:?}"))
            })?;
            config.default_options.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Set the CLI path
    pub fn with_cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_path = Some(path.into());
        self
    }

    /// Set the default query options
    pub fn with_default_options(mut self, options: QueryOptions) -> Self {
        self.default_options = options;
        self
    }
}

/// A single query: prompt plus optional options snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    prompt: String,
    options: Option<QueryOptions>,
}

impl QueryRequest {
    /// Create a request with the client's default options
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the prompt is empty or blank.
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        Self::builder().prompt(prompt).build()
    }

    /// Create a builder
    pub fn builder() -> QueryRequestBuilder {
        QueryRequestBuilder::default()
    }

    /// Use `options` instead of the client defaults
    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The prompt text
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The options snapshot, if set
    pub fn options(&self) -> Option<&QueryOptions> {
        self.options.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<QueryOptions>) {
        (self.prompt, self.options)
    }
}

/// Builder for [`QueryRequest`]
#[derive(Debug, Default)]
pub struct QueryRequestBuilder {
    prompt: Option<String>,
    options: Option<QueryOptions>,
}

impl QueryRequestBuilder {
    /// Set the prompt
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the options snapshot
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Build the request
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the prompt is missing or blank.
    pub fn build(self) -> Result<QueryRequest> {
        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AgentError::Config("Prompt cannot be empty".to_string()))?;

        Ok(QueryRequest {
            prompt,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.cli_path, None);
        assert_eq!(config.default_options, QueryOptions::default());
    }

    #[test]
    fn test_from_env_reads_variables() {
        temp_env::with_vars(
            [
                (CLI_PATH_ENV, Some("/opt/claude/bin/claude")),
                (TIMEOUT_ENV, Some("1500")),
            ],
            || {
                let config = ClientConfig::from_env().unwrap();
                assert_eq!(config.cli_path, Some(PathBuf::from("/opt/claude/bin/claude")));
                assert_eq!(config.default_options.timeout, Duration::from_millis(1500));
            },
        );
    }

    #[test]
    fn test_from_env_defaults_when_unset() {
        temp_env::with_vars_unset([CLI_PATH_ENV, TIMEOUT_ENV], || {
            assert_eq!(ClientConfig::from_env().unwrap(), ClientConfig::default());
        });
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        temp_env::with_var(TIMEOUT_ENV, Some("ten seconds"), || {
            let err = ClientConfig::from_env().unwrap_err();
            assert!(matches!(err, AgentError::Config(msg) if msg.contains(TIMEOUT_ENV)));
        });
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn test_blank_prompt_rejected(#[case] prompt: &str) {
        assert!(matches!(
            QueryRequest::new(prompt),
            Err(AgentError::Config(_))
        ));
    }

    #[test]
    fn test_missing_prompt_rejected() {
        assert!(QueryRequest::builder().build().is_err());
    }

    #[test]
    fn test_request_builder() {
        let options = QueryOptions::new().with_model("sonnet");
        let request = QueryRequest::builder()
            .prompt("What is 2 + 2?")
            .options(options.clone())
            .build()
            .unwrap();
        assert_eq!(request.prompt(), "What is 2 + 2?");
        assert_eq!(request.options(), Some(&options));

        let plain = QueryRequest::new("hi").unwrap();
        assert_eq!(plain.options(), None);
    }
}
