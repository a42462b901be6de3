//! Locating the Claude Code CLI executable
//!
//! Resolution order: an explicit path, then `PATH`, then a fixed list of
//! install locations used by npm, yarn and the native installer.

use crate::error::{Result, TransportError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the CLI executable
pub const CLI_NAME: &str = "claude";

/// Name of the JavaScript runtime the CLI is installed with
pub const RUNTIME_NAME: &str = "node";

/// Locates the CLI executable
///
/// Holds the search inputs explicitly so discovery can be exercised against
/// temporary directories.
#[derive(Debug, Clone)]
pub struct CliLocator {
    search_path: Option<OsString>,
    home: Option<PathBuf>,
}

impl Default for CliLocator {
    fn default() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
            home: dirs::home_dir(),
        }
    }
}

impl CliLocator {
    /// Locator reading `PATH` and the home directory of the current user
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `PATH`-style search list
    pub fn with_search_path(mut self, search_path: impl Into<OsString>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Override the home directory used for well-known locations
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Well-known install locations, in search order
    pub fn well_known_locations(&self) -> Vec<PathBuf> {
        let mut locations = Vec::new();
        if let Some(home) = &self.home {
            locations.push(home.join(".npm-global/bin").join(CLI_NAME));
        }
        locations.push(PathBuf::from("/usr/local/bin").join(CLI_NAME));
        if let Some(home) = &self.home {
            for dir in [".local/bin", "node_modules/.bin", ".yarn/bin", ".claude/local"] {
                locations.push(home.join(dir).join(CLI_NAME));
            }
        }
        locations
    }

    /// Resolve the CLI executable
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotFound`] when nothing matches. The error
    /// tells apart a missing JavaScript runtime from a missing CLI.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.is_file() {
                debug!(cli_path = %path.display(), "Using explicit CLI path");
                return Ok(path.to_path_buf());
            }
            return Err(TransportError::NotFound {
                message: format!("Claude Code not found at: {}", path.display()),
                runtime_missing: false,
            });
        }

        if let Some(path) = self.search(CLI_NAME) {
            debug!(cli_path = %path.display(), "Found CLI on PATH");
            return Ok(path);
        }

        if let Some(path) = self
            .well_known_locations()
            .into_iter()
            .find(|candidate| candidate.is_file())
        {
            debug!(cli_path = %path.display(), "Found CLI in well-known location");
            return Ok(path);
        }

        let runtime_missing = self.search(RUNTIME_NAME).is_none();
        Err(not_found(runtime_missing))
    }

    fn search(&self, binary: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(binary, self.search_path.as_ref(), cwd).ok()
    }
}

fn not_found(runtime_missing: bool) -> TransportError {
    let message = if runtime_missing {
        "Claude Code requires Node.js, which is not installed.\n\n\
         Install Node.js from: https://nodejs.org/\n\n\
         After installing Node.js, install Claude Code:\n  \
         npm install -g @anthropic-ai/claude-code"
    } else {
        "Claude Code not found. Install with:\n  \
         npm install -g @anthropic-ai/claude-code\n\n\
         If already installed locally, try:\n  \
         export PATH=\"$HOME/node_modules/.bin:$PATH\"\n\n\
         Or pass the executable path explicitly."
    };
    TransportError::NotFound {
        message: message.to_string(),
        runtime_missing,
    }
}
