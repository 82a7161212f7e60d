//! Client configuration
//!
//! [`Configuration`] is process-wide and owned by the client. It may change
//! between calls; every call works on the snapshot taken when it started.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::backend::BackendKind;

/// Default executable for the direct CLI backend
pub const DEFAULT_COMMAND: &str = "claude";

/// Client-wide settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// Active backend
    pub backend: BackendKind,
    /// CLI executable name or path
    pub command: String,
    /// Default working directory for spawned processes
    pub working_directory: Option<PathBuf>,
    /// Environment overrides for spawned processes
    pub environment: HashMap<String, String>,
    /// Verbose per-line logging
    pub debug: bool,
    /// Extra directories searched before `PATH`
    pub additional_paths: Vec<PathBuf>,
    /// Explicit Node.js interpreter for the bridged runtime
    pub node_executable: Option<PathBuf>,
    /// Bridge program override; the embedded bridge is used otherwise
    pub bridge_script: Option<PathBuf>,
    /// Arguments appended after all generated flags (test hook)
    pub command_suffix: Vec<String>,
    /// Claude Code data directory, `$HOME/.claude` when unset
    pub claude_home: Option<PathBuf>,
    /// Let a failed explicit `node_executable` fall back to auto-detection
    pub fallback_to_auto_detect: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            backend: BackendKind::DirectCli,
            command: DEFAULT_COMMAND.to_string(),
            working_directory: None,
            environment: HashMap::new(),
            debug: false,
            additional_paths: Vec::new(),
            node_executable: None,
            bridge_script: None,
            command_suffix: Vec::new(),
            claude_home: None,
            fallback_to_auto_detect: false,
        }
    }
}

impl Configuration {
    /// Create a new builder for `Configuration`
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Defaults overlaid with `CLAUDE_CODE_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    ///
    /// Recognized keys: `CLAUDE_CODE_COMMAND`, `CLAUDE_CODE_BACKEND`
    /// (`cli` | `bridge`), `CLAUDE_CODE_NODE`, `CLAUDE_CODE_DEBUG`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(command) = lookup("CLAUDE_CODE_COMMAND").filter(|c| !c.is_empty()) {
            config.command = command;
        }
        if let Some(backend) = lookup("CLAUDE_CODE_BACKEND") {
            match backend.parse() {
                Ok(kind) => config.backend = kind,
                Err(e) => log::warn!("Ignoring CLAUDE_CODE_BACKEND: {e}"),
            }
        }
        if let Some(node) = lookup("CLAUDE_CODE_NODE").filter(|n| !n.is_empty()) {
            config.node_executable = Some(PathBuf::from(node));
        }
        if let Some(debug) = lookup("CLAUDE_CODE_DEBUG") {
            config.debug = matches!(debug.as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Claude Code data directory
    #[must_use]
    pub fn claude_home(&self) -> Option<PathBuf> {
        self.claude_home
            .clone()
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".claude")))
    }
}

/// Builder for `Configuration`
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    config: Configuration,
}

impl ConfigurationBuilder {
    /// Set backend
    #[must_use]
    pub const fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set CLI command
    #[must_use]
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.config.command = command.into();
        self
    }

    /// Set working directory
    #[must_use]
    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.working_directory = Some(dir.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.environment.insert(key.into(), value.into());
        self
    }

    /// Enable debug logging
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Add a search path
    #[must_use]
    pub fn additional_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.additional_paths.push(path.into());
        self
    }

    /// Set explicit Node.js interpreter
    #[must_use]
    pub fn node_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.node_executable = Some(path.into());
        self
    }

    /// Set bridge program override
    #[must_use]
    pub fn bridge_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bridge_script = Some(path.into());
        self
    }

    /// Set trailing arguments
    #[must_use]
    pub fn command_suffix<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.command_suffix = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set Claude Code data directory
    #[must_use]
    pub fn claude_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.claude_home = Some(dir.into());
        self
    }

    /// Allow fallback from an explicit interpreter to auto-detection
    #[must_use]
    pub const fn fallback_to_auto_detect(mut self, fallback: bool) -> Self {
        self.config.fallback_to_auto_detect = fallback;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> Configuration {
        self.config
    }
}
