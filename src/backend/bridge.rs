//! Bridged runtime backend: the Agent SDK driven through Node.js

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::VERSION;
use crate::error::{ClaudeError, Result};
use crate::message::encode_invocation;
use crate::types::configuration::Configuration;
use crate::types::diagnostics::SessionInfo;
use crate::types::invocation::Invocation;

use super::locator::RuntimeLocator;
use super::{BackendCapabilities, BackendKind, LaunchTarget, OutputFormats};

/// npm package the bridge imports
pub const SDK_PACKAGE: &str = "@anthropic-ai/claude-agent-sdk";

/// Environment variable carrying the SDK package location to the bridge
pub const SDK_PATH_ENV: &str = "CLAUDE_AGENT_SDK_PATH";

const BRIDGE_SOURCE: &str = include_str!("../../bridge/sdk-bridge.mjs");
const BRIDGE_FILE_NAME: &str = "sdk-bridge.mjs";

/// Source of the embedded bridge program
#[must_use]
pub const fn bridge_source() -> &'static str {
    BRIDGE_SOURCE
}

/// Runs the bridge program under a resolved Node.js interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeBackend {
    node: PathBuf,
    package: PathBuf,
    script: PathBuf,
}

impl BridgeBackend {
    /// Resolve the interpreter, the SDK package and the bridge program
    ///
    /// An explicit `node_executable` is used as is: auto-detection is not
    /// consulted, and a missing SDK package under its prefix is an error,
    /// unless `fallback_to_auto_detect` is set.
    ///
    /// # Errors
    /// - `NotInstalled` if no Node.js interpreter can be found, or the
    ///   explicit one does not exist
    /// - `InvalidConfig` if the SDK package or the bridge program is missing
    pub fn validate(config: &Configuration, locator: &dyn RuntimeLocator) -> Result<Self> {
        let (node, package) = resolve_runtime(config, locator)?;
        let script = match config.bridge_script {
            Some(ref script) if script.is_file() => script.clone(),
            Some(ref script) => {
                return Err(ClaudeError::invalid_config(format!(
                    "bridge script {} does not exist",
                    script.display()
                )));
            }
            None => materialize_bridge()?,
        };

        log::debug!(
            "Bridge backend: node {}, sdk {}, script {}",
            node.display(),
            package.display(),
            script.display()
        );
        Ok(Self {
            node,
            package,
            script,
        })
    }

    /// Resolved Node.js interpreter
    #[must_use]
    pub fn node(&self) -> &Path {
        &self.node
    }

    /// Resolved SDK package directory
    #[must_use]
    pub fn package(&self) -> &Path {
        &self.package
    }

    /// Bridge program path
    #[must_use]
    pub fn script(&self) -> &Path {
        &self.script
    }
}

impl BackendCapabilities for BridgeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::BridgedRuntime
    }

    fn supported_output_formats(&self) -> OutputFormats {
        OutputFormats::STREAM_JSON
    }

    fn build_target(&self, invocation: &Invocation, config: &Configuration) -> Result<LaunchTarget> {
        self.check_output_format(invocation.output_format())?;

        let encoded = encode_invocation(invocation, BackendKind::BridgedRuntime);
        let mut args = vec![self.script.to_string_lossy().into_owned()];
        args.extend(
            encoded
                .payload
                .to_args(&config.command_suffix)
                .map_err(|e| ClaudeError::invalid_config(format!("cannot encode bridge request: {e}")))?,
        );

        Ok(LaunchTarget {
            program: self.node.clone(),
            args,
            stdin: encoded.stdin,
            env: vec![(
                SDK_PATH_ENV.to_string(),
                self.package.to_string_lossy().into_owned(),
            )],
            warnings: encoded.warnings,
        })
    }

    fn records_command_info(&self) -> bool {
        false
    }

    fn list_sessions(&self, _config: &Configuration) -> Result<Vec<SessionInfo>> {
        log::debug!("The bridge backend has no session store; returning no sessions");
        Ok(Vec::new())
    }
}

/// Where the SDK package would live for an interpreter
///
/// `<prefix>/lib/node_modules/@anthropic-ai/claude-agent-sdk`, where
/// `<prefix>` is the parent of the interpreter's `bin/` directory, first as
/// given and then with symlinks resolved.
#[must_use]
pub fn sdk_package_candidates(node: &Path) -> Vec<PathBuf> {
    let package_under = |node: &Path| {
        node.parent()
            .and_then(Path::parent)
            .map(|prefix| prefix.join("lib").join("node_modules").join(SDK_PACKAGE))
    };

    let mut candidates: Vec<PathBuf> = package_under(node).into_iter().collect();
    if let Ok(resolved) = fs::canonicalize(node)
        && let Some(package) = package_under(&resolved)
        && !candidates.contains(&package)
    {
        candidates.push(package);
    }
    candidates
}

fn find_package(node: &Path) -> std::result::Result<PathBuf, PathBuf> {
    let candidates = sdk_package_candidates(node);
    candidates
        .iter()
        .find(|candidate| candidate.is_dir())
        .cloned()
        .ok_or_else(|| {
            candidates
                .into_iter()
                .next()
                .unwrap_or_else(|| node.join(SDK_PACKAGE))
        })
}

fn resolve_runtime(config: &Configuration, locator: &dyn RuntimeLocator) -> Result<(PathBuf, PathBuf)> {
    if let Some(ref explicit) = config.node_executable {
        match check_explicit(explicit) {
            Ok(package) => return Ok((explicit.clone(), package)),
            Err(e) if config.fallback_to_auto_detect => {
                log::warn!("{e}; falling back to Node.js auto-detection");
            }
            Err(e) => return Err(e),
        }
    }

    let node = locator.locate().ok_or_else(|| {
        ClaudeError::not_installed(
            "Node.js was not found. Install Node.js or set `node_executable` in the configuration",
        )
    })?;
    log::debug!("Auto-detected Node.js at {}", node.display());

    let package = find_package(&node).map_err(|expected| {
        ClaudeError::invalid_config(format!(
            "{SDK_PACKAGE} is not installed for {} (expected {}). Install with:\n\
             npm install -g {SDK_PACKAGE}",
            node.display(),
            expected.display()
        ))
    })?;
    Ok((node, package))
}

fn check_explicit(node: &Path) -> Result<PathBuf> {
    if !node.is_file() {
        return Err(ClaudeError::not_installed(format!(
            "node_executable {} does not exist",
            node.display()
        )));
    }
    find_package(node).map_err(|expected| {
        ClaudeError::invalid_config(format!(
            "{SDK_PACKAGE} not found at {} (derived from node_executable {})",
            expected.display(),
            node.display()
        ))
    })
}

/// Write the embedded bridge program once per crate version
fn materialize_bridge() -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("claude-code-client-{VERSION}"));
    let path = dir.join(BRIDGE_FILE_NAME);
    if fs::read_to_string(&path).is_ok_and(|existing| existing == BRIDGE_SOURCE) {
        return Ok(path);
    }

    let write = || -> std::io::Result<()> {
        fs::create_dir_all(&dir)?;
        // Write then rename so concurrent clients never see a partial file
        let staging = dir.join(format!("{BRIDGE_FILE_NAME}.{}.tmp", Uuid::new_v4()));
        fs::write(&staging, BRIDGE_SOURCE)?;
        fs::rename(&staging, &path)
    };
    write().map_err(|e| {
        ClaudeError::invalid_config(format!(
            "cannot write bridge program to {}: {e}",
            path.display()
        ))
    })?;
    log::debug!("Wrote bridge program to {}", path.display());
    Ok(path)
}
