//! Error types for the Claude Code client

use std::time::Duration;

use thiserror::Error;

use crate::backend::BackendKind;
use crate::types::output::OutputFormat;

/// Main error type for the Claude Code client
#[derive(Error, Debug)]
pub enum ClaudeError {
    /// The external binary or runtime cannot be located at all
    #[error("Claude Code not installed: {0}")]
    NotInstalled(String),

    /// Configuration was rejected before any process was started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to start the process
    #[error("Failed to launch process: {0}")]
    ProcessLaunch(String),

    /// Requested output format is not available on the active backend
    #[error("Output format '{format}' is not supported by the {backend} backend")]
    UnsupportedOutputFormat {
        /// Requested format
        format: OutputFormat,
        /// Backend that rejected it
        backend: BackendKind,
    },

    /// Process ran and exited unsuccessfully
    #[error("Execution failed ({}): {message}", exit_label(.exit_code))]
    ExecutionFailed {
        /// Exit code, `None` when terminated by a signal
        exit_code: Option<i32>,
        /// Structured error message when the process produced one
        message: String,
        /// Tail of the process standard error
        stderr: String,
    },

    /// Structured output could not be parsed where parsing was required
    #[error("Decode error: {message}")]
    Decode {
        /// What went wrong
        message: String,
        /// Offending line, if any
        line: Option<String>,
    },

    /// Invocation exceeded its deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Invocation was cancelled by the caller
    #[error("Invocation cancelled")]
    Cancelled,

    /// I/O error on an already running process
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClaudeError>;

impl ClaudeError {
    /// Create a not-installed error
    pub fn not_installed(msg: impl Into<String>) -> Self {
        Self::NotInstalled(msg.into())
    }

    /// Not-installed error for the Claude Code CLI itself
    #[must_use]
    pub fn cli_not_found(command: &str) -> Self {
        Self::NotInstalled(format!(
            "'{command}' was not found. Install with:\n\
             npm install -g @anthropic-ai/claude-code\n\
             \n\
             or set `command` / `additional_paths` in the configuration"
        ))
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a process launch error
    pub fn process_launch(msg: impl Into<String>) -> Self {
        Self::ProcessLaunch(msg.into())
    }

    /// Create an unsupported output format error
    #[must_use]
    pub const fn unsupported_output_format(format: OutputFormat, backend: BackendKind) -> Self {
        Self::UnsupportedOutputFormat { format, backend }
    }

    /// Create an execution failure
    pub fn execution_failed(
        exit_code: Option<i32>,
        message: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ExecutionFailed {
            exit_code,
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>, line: Option<String>) -> Self {
        Self::Decode {
            message: msg.into(),
            line,
        }
    }

    /// Errors raised before any process is spawned
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NotInstalled(_) | Self::InvalidConfig(_) | Self::UnsupportedOutputFormat { .. }
        )
    }

    /// Errors raised after a process was started; the process is already reaped
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(
            self,
            Self::ProcessLaunch(_)
                | Self::ExecutionFailed { .. }
                | Self::Timeout(_)
                | Self::Cancelled
        )
    }
}
