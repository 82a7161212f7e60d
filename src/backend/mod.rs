//! Backend abstraction
//!
//! Two execution strategies share one contract ([`BackendCapabilities`]):
//!
//! - [`CliBackend`] runs the Claude Code CLI binary directly and supports
//!   every output format
//! - [`BridgeBackend`] runs a small bridge program under Node.js that calls
//!   the Claude Agent SDK; it only produces `stream-json`
//!
//! A [`Backend`] is the validated form of a configuration: building one
//! resolves every executable and path the backend needs, so a call never
//! discovers a configuration problem halfway through.

mod bridge;
mod cli;
mod locator;

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};
use crate::message::{CapabilityWarning, decode_buffered};
use crate::stream::MessageStream;
use crate::transport::{LaunchSpec, ProcessRunner, display_command_line};
use crate::types::configuration::Configuration;
use crate::types::diagnostics::SessionInfo;
use crate::types::invocation::Invocation;
use crate::types::output::{ClaudeResult, OutputFormat, StreamDelivery};

pub use bridge::{BridgeBackend, SDK_PACKAGE, SDK_PATH_ENV, bridge_source, sdk_package_candidates};
pub use cli::CliBackend;
pub use locator::{NodeLocator, RuntimeLocator};

/// Which execution strategy a configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    /// Run the `claude` binary
    #[default]
    #[serde(rename = "cli")]
    DirectCli,
    /// Run the SDK bridge under Node.js
    #[serde(rename = "bridge")]
    BridgedRuntime,
}

impl BackendKind {
    /// Short name used in configuration and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectCli => "cli",
            Self::BridgedRuntime => "bridge",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ClaudeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" | "direct-cli" | "directcli" => Ok(Self::DirectCli),
            "bridge" | "bridged-runtime" | "bridgedruntime" | "sdk" => Ok(Self::BridgedRuntime),
            other => Err(ClaudeError::invalid_config(format!(
                "unknown backend '{other}' (expected 'cli' or 'bridge')"
            ))),
        }
    }
}

bitflags! {
    /// Set of output formats a backend can produce
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OutputFormats: u8 {
        /// Plain text
        const TEXT = 0b001;
        /// Single JSON document
        const JSON = 0b010;
        /// Newline-delimited JSON
        const STREAM_JSON = 0b100;
    }
}

impl OutputFormats {
    /// Flag for one format
    #[must_use]
    pub const fn of(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::TEXT,
            OutputFormat::Json => Self::JSON,
            OutputFormat::StreamJson => Self::STREAM_JSON,
        }
    }

    /// Whether `format` is in the set
    #[must_use]
    pub const fn supports(self, format: OutputFormat) -> bool {
        self.contains(Self::of(format))
    }
}

/// Concrete process to start for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchTarget {
    /// Executable
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Content for standard input
    pub stdin: Option<String>,
    /// Backend-specific environment additions
    pub env: Vec<(String, String)>,
    /// Options the backend translated or dropped
    pub warnings: Vec<CapabilityWarning>,
}

impl LaunchTarget {
    /// Shell-quoted command line for diagnostics
    #[must_use]
    pub fn command_line(&self) -> String {
        display_command_line(&self.program.to_string_lossy(), &self.args)
    }

    /// Combine with the configuration snapshot and per-call options
    pub(crate) fn into_launch_spec(
        self,
        invocation: &Invocation,
        config: &Configuration,
        cancel: CancellationToken,
    ) -> LaunchSpec {
        let options = invocation.options();
        let mut spec = LaunchSpec::new(self.program, self.args);
        spec.cwd = options.cwd.clone().or_else(|| config.working_directory.clone());
        spec.env = child_environment(config, &options.env);
        spec.env.extend(self.env);
        spec.stdin = self.stdin;
        spec.timeout = options.timeout;
        spec.cancel = cancel;
        spec.invocation_id = invocation.id();
        spec.debug = config.debug;
        spec
    }
}

/// Capability contract shared by both backends
pub trait BackendCapabilities {
    /// Strategy this backend implements
    fn kind(&self) -> BackendKind;

    /// Output formats this backend can produce
    fn supported_output_formats(&self) -> OutputFormats;

    /// Build the process to start for `invocation`
    ///
    /// # Errors
    /// Returns `UnsupportedOutputFormat` or `InvalidConfig` before anything
    /// is spawned
    fn build_target(&self, invocation: &Invocation, config: &Configuration) -> Result<LaunchTarget>;

    /// Whether executed command lines are meaningful diagnostics for this backend
    fn records_command_info(&self) -> bool;

    /// Sessions persisted by the backend, newest first
    ///
    /// # Errors
    /// Returns error if the session store exists but cannot be read
    fn list_sessions(&self, config: &Configuration) -> Result<Vec<SessionInfo>>;

    /// Reject formats outside [`supported_output_formats`](Self::supported_output_formats)
    ///
    /// # Errors
    /// Returns `UnsupportedOutputFormat`
    fn check_output_format(&self, format: OutputFormat) -> Result<()> {
        if self.supported_output_formats().supports(format) {
            Ok(())
        } else {
            Err(ClaudeError::unsupported_output_format(format, self.kind()))
        }
    }
}

/// A validated backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Direct CLI execution
    Cli(CliBackend),
    /// Node.js bridge execution
    Bridge(BridgeBackend),
}

impl Backend {
    /// Validate `config` for its selected backend
    ///
    /// Only touches the filesystem; never spawns a process.
    ///
    /// # Errors
    /// - `NotInstalled` if the CLI binary or a Node.js runtime cannot be found
    /// - `InvalidConfig` for anything else that makes the backend unusable
    pub fn validate(config: &Configuration, locator: &dyn RuntimeLocator) -> Result<Self> {
        match config.backend {
            BackendKind::DirectCli => CliBackend::validate(config).map(Self::Cli),
            BackendKind::BridgedRuntime => BridgeBackend::validate(config, locator).map(Self::Bridge),
        }
    }

    /// Run a launch spec and deliver its output in the requested form
    ///
    /// Live `stream-json` returns as soon as the process is running; every
    /// other combination returns after the process has exited.
    ///
    /// # Errors
    /// Any runtime-class error; the process is reaped before it is returned
    pub async fn execute(
        &self,
        runner: &ProcessRunner,
        spec: LaunchSpec,
        invocation: &Invocation,
    ) -> Result<ClaudeResult> {
        let format = invocation.output_format();
        self.check_output_format(format)?;

        let cancel = spec.cancel.clone();
        let handle = match runner.run(spec).await {
            Ok(handle) => handle,
            Err(e) => {
                cancel.cancel();
                return Err(e);
            }
        };

        match (format, invocation.options().delivery) {
            (OutputFormat::StreamJson, StreamDelivery::Live) => {
                Ok(ClaudeResult::Stream(MessageStream::live(handle)))
            }
            _ => {
                let output = handle.collect_output().await?;
                decode_buffered(format, &output)
            }
        }
    }
}

impl BackendCapabilities for Backend {
    fn kind(&self) -> BackendKind {
        match self {
            Self::Cli(backend) => backend.kind(),
            Self::Bridge(backend) => backend.kind(),
        }
    }

    fn supported_output_formats(&self) -> OutputFormats {
        match self {
            Self::Cli(backend) => backend.supported_output_formats(),
            Self::Bridge(backend) => backend.supported_output_formats(),
        }
    }

    fn build_target(&self, invocation: &Invocation, config: &Configuration) -> Result<LaunchTarget> {
        match self {
            Self::Cli(backend) => backend.build_target(invocation, config),
            Self::Bridge(backend) => backend.build_target(invocation, config),
        }
    }

    fn records_command_info(&self) -> bool {
        match self {
            Self::Cli(backend) => backend.records_command_info(),
            Self::Bridge(backend) => backend.records_command_info(),
        }
    }

    fn list_sessions(&self, config: &Configuration) -> Result<Vec<SessionInfo>> {
        match self {
            Self::Cli(backend) => backend.list_sessions(config),
            Self::Bridge(backend) => backend.list_sessions(config),
        }
    }
}

/// Configuration values that decide a validation verdict
///
/// A cached verdict is reused only while all of these are unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationKey {
    backend: BackendKind,
    command: String,
    working_directory: Option<PathBuf>,
    additional_paths: Vec<PathBuf>,
    search_path: Option<String>,
    node_executable: Option<PathBuf>,
    bridge_script: Option<PathBuf>,
    fallback_to_auto_detect: bool,
}

impl From<&Configuration> for ValidationKey {
    fn from(config: &Configuration) -> Self {
        Self {
            backend: config.backend,
            command: config.command.clone(),
            working_directory: config.working_directory.clone(),
            additional_paths: config.additional_paths.clone(),
            search_path: config.environment.get("PATH").cloned(),
            node_executable: config.node_executable.clone(),
            bridge_script: config.bridge_script.clone(),
            fallback_to_auto_detect: config.fallback_to_auto_detect,
        }
    }
}

/// `PATH` for the child: additional paths first, then the configured or
/// inherited `PATH`
pub(crate) fn search_path(config: &Configuration) -> Option<OsString> {
    let base = config
        .environment
        .get("PATH")
        .map(OsString::from)
        .or_else(|| std::env::var_os("PATH"));
    let inherited = base.iter().flat_map(std::env::split_paths).collect::<Vec<_>>();
    std::env::join_paths(config.additional_paths.iter().cloned().chain(inherited)).ok()
}

/// Environment overrides for a child process
///
/// Configuration environment first, then per-call overrides; `PATH` is
/// prefixed with the additional search paths.
fn child_environment(
    config: &Configuration,
    call_env: &std::collections::BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut env: HashMap<String, String> = config.environment.clone();
    env.extend(call_env.iter().map(|(k, v)| (k.clone(), v.clone())));

    if !config.additional_paths.is_empty() {
        match search_path(config) {
            Some(path) => {
                env.insert("PATH".to_string(), path.to_string_lossy().into_owned());
            }
            None => log::warn!("additional_paths contain a path separator; PATH left unchanged"),
        }
    }

    let mut env: Vec<_> = env.into_iter().collect();
    env.sort();
    env
}
