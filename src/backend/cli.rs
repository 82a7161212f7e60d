//! Direct CLI backend

use std::path::{Path, PathBuf};

use crate::client::sessions::scan_session_store;
use crate::error::{ClaudeError, Result};
use crate::message::encode_invocation;
use crate::types::configuration::Configuration;
use crate::types::diagnostics::SessionInfo;
use crate::types::invocation::Invocation;

use super::{BackendCapabilities, BackendKind, LaunchTarget, OutputFormats, search_path};

/// Runs the resolved Claude Code CLI binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliBackend {
    executable: PathBuf,
}

impl CliBackend {
    /// Resolve the configured command
    ///
    /// A command containing a path separator must name an existing file
    /// (relative paths resolve against the working directory). A bare name
    /// is searched in `additional_paths`, then `PATH`.
    ///
    /// # Errors
    /// - `InvalidConfig` for an empty command
    /// - `NotInstalled` if the command cannot be resolved
    pub fn validate(config: &Configuration) -> Result<Self> {
        let command = config.command.trim();
        if command.is_empty() {
            return Err(ClaudeError::invalid_config("command is empty"));
        }

        let path = Path::new(command);
        if path.is_absolute() || path.components().count() > 1 {
            let executable = match config.working_directory {
                Some(ref dir) if path.is_relative() => dir.join(path),
                _ => path.to_path_buf(),
            };
            if executable.is_file() {
                return Ok(Self { executable });
            }
            return Err(ClaudeError::cli_not_found(command));
        }

        let cwd = match config.working_directory {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")),
        };
        which::which_in(command, search_path(config), cwd)
            .map(|executable| {
                log::debug!("Resolved '{command}' to {}", executable.display());
                Self { executable }
            })
            .map_err(|_| ClaudeError::cli_not_found(command))
    }

    /// Resolved executable
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl BackendCapabilities for CliBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::DirectCli
    }

    fn supported_output_formats(&self) -> OutputFormats {
        OutputFormats::all()
    }

    fn build_target(&self, invocation: &Invocation, config: &Configuration) -> Result<LaunchTarget> {
        self.check_output_format(invocation.output_format())?;

        let encoded = encode_invocation(invocation, BackendKind::DirectCli);
        let args = encoded
            .payload
            .to_args(&config.command_suffix)
            .map_err(|e| ClaudeError::invalid_config(format!("cannot encode arguments: {e}")))?;

        Ok(LaunchTarget {
            program: self.executable.clone(),
            args,
            stdin: encoded.stdin,
            env: Vec::new(),
            warnings: encoded.warnings,
        })
    }

    fn records_command_info(&self) -> bool {
        true
    }

    fn list_sessions(&self, config: &Configuration) -> Result<Vec<SessionInfo>> {
        match config.claude_home() {
            Some(home) => scan_session_store(&home),
            None => {
                log::warn!("HOME is not set and no claude_home configured; no sessions listed");
                Ok(Vec::new())
            }
        }
    }
}
