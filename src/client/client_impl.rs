//! `ClaudeCodeClient` implementation
//!
//! Constructors, configuration management, validation and the public
//! execution methods.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::{Backend, BackendCapabilities, BackendKind, NodeLocator, RuntimeLocator, ValidationKey};
use crate::error::{ClaudeError, Result};
use crate::transport::ProcessRunner;
use crate::types::configuration::Configuration;
use crate::types::diagnostics::{ExecutedCommandInfo, SessionInfo};
use crate::types::identifiers::SessionId;
use crate::types::invocation::{ExecutionMethod, Invocation};
use crate::types::options::InvocationOptions;
use crate::types::output::{ClaudeResult, OutputFormat};

use super::ClaudeCodeClient;
use super::tasks::link_cancellation;

impl ClaudeCodeClient {
    /// Create a client; validation happens on first use or via [`validate`](Self::validate)
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        Self {
            config: RwLock::new(config),
            validated: Mutex::new(None),
            last_executed: Mutex::new(None),
            runner: ProcessRunner::new(),
            shutdown: Mutex::new(CancellationToken::new()),
            locator: None,
        }
    }

    /// Create a client from defaults and `CLAUDE_CODE_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(Configuration::from_env())
    }

    /// Use `locator` instead of [`NodeLocator`] to find Node.js
    #[must_use]
    pub fn with_locator(mut self, locator: Arc<dyn RuntimeLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Snapshot of the current configuration
    #[must_use]
    pub fn configuration(&self) -> Configuration {
        self.config.read().clone()
    }

    /// Change the configuration
    ///
    /// A change of backend is validated first; if the new backend is not
    /// usable the configuration is left exactly as it was.
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` carrying the validation diagnosis
    pub fn update_configuration(&self, update: impl FnOnce(&mut Configuration)) -> Result<()> {
        let mut config = self.config.write();
        let previous = config.clone();
        update(&mut *config);

        if config.backend != previous.backend
            && let Err(e) = self.resolve(&config)
        {
            let rejected = config.backend;
            *config = previous;
            log::warn!("Rejected switch to the {rejected} backend: {e}");
            return Err(match e {
                ClaudeError::InvalidConfig(_) => e,
                other => ClaudeError::invalid_config(format!(
                    "cannot switch to the {rejected} backend: {other}"
                )),
            });
        }

        log::debug!("Configuration updated (backend {})", config.backend);
        Ok(())
    }

    /// Switch backends, keeping the current one if the new one does not validate
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` if the new backend is not usable
    pub fn set_backend(&self, backend: BackendKind) -> Result<()> {
        self.update_configuration(|config| config.backend = backend)
    }

    /// Check that the active backend can run
    ///
    /// Only probes the filesystem and never starts a process. A successful
    /// verdict is cached until a field it depends on changes.
    ///
    /// # Errors
    /// - `ClaudeError::NotInstalled` if the CLI or Node.js cannot be found
    /// - `ClaudeError::InvalidConfig` for any other unusable configuration
    pub fn validate(&self) -> Result<()> {
        let config = self.configuration();
        self.resolve(&config).map(|_| ())
    }

    /// Run a fresh prompt
    ///
    /// # Errors
    /// Validation-class errors before anything is spawned, runtime-class
    /// errors after the process has been reaped
    pub async fn run_single_prompt(
        &self,
        prompt: impl Into<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Result<ClaudeResult> {
        self.execute(Invocation::single_prompt(prompt, output_format, options))
            .await
    }

    /// Run a prompt delivered on standard input
    ///
    /// For payloads too large for, or unsafe in, a command-line argument.
    ///
    /// # Errors
    /// Same as [`run_single_prompt`](Self::run_single_prompt)
    pub async fn run_with_stdin(
        &self,
        stdin: impl Into<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Result<ClaudeResult> {
        self.execute(Invocation::with_stdin(stdin, output_format, options))
            .await
    }

    /// Continue the most recent conversation in the working directory
    ///
    /// # Errors
    /// Same as [`run_single_prompt`](Self::run_single_prompt)
    pub async fn continue_conversation(
        &self,
        prompt: Option<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Result<ClaudeResult> {
        self.execute(Invocation::continue_last(prompt, output_format, options))
            .await
    }

    /// Resume a conversation by session id
    ///
    /// # Errors
    /// `ClaudeError::InvalidConfig` for a blank session id, otherwise the
    /// same as [`run_single_prompt`](Self::run_single_prompt)
    pub async fn resume_conversation(
        &self,
        session_id: impl Into<SessionId>,
        prompt: Option<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Result<ClaudeResult> {
        let invocation = Invocation::resume(session_id, prompt, output_format, options)?;
        self.execute(invocation).await
    }

    /// Sessions persisted by the active backend, newest first
    ///
    /// The bridge backend has no session store and always returns an empty
    /// list. No process is started. On the CLI backend the command info
    /// snapshot records the scanned store; on the bridge it is cleared.
    ///
    /// # Errors
    /// Validation-class errors, or `ClaudeError::Io` if the store cannot be read
    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let config = self.configuration();
        let backend = self.resolve(&config)?;

        let info = backend.records_command_info().then(|| ExecutedCommandInfo {
            invocation_id: Uuid::new_v4(),
            command_line: config
                .claude_home()
                .map(|home| home.join("projects").display().to_string())
                .unwrap_or_default(),
            working_directory: config.working_directory.clone(),
            stdin: None,
            timestamp: Utc::now(),
            method: ExecutionMethod::ListSessions,
            backend: backend.kind(),
        });
        *self.last_executed.lock() = info;

        tokio::task::spawn_blocking(move || backend.list_sessions(&config))
            .await
            .map_err(|e| ClaudeError::Io(std::io::Error::other(e)))?
    }

    /// Diagnostics for the most recent call, if the backend records them
    #[must_use]
    pub fn last_executed_command_info(&self) -> Option<ExecutedCommandInfo> {
        self.last_executed.lock().clone()
    }

    /// Cancel every call in flight
    ///
    /// Calls started afterwards are unaffected.
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.shutdown.lock(), CancellationToken::new());
        log::info!("Cancelling in-flight invocations");
        previous.cancel();
    }

    /// Number of processes this client has started
    #[must_use]
    pub fn processes_spawned(&self) -> usize {
        self.runner.processes_spawned()
    }

    /// Validated backend for `config`, from cache when still valid
    fn resolve(&self, config: &Configuration) -> Result<Backend> {
        let key = ValidationKey::from(config);
        if let Some((ref cached_key, ref backend)) = *self.validated.lock()
            && *cached_key == key
        {
            return Ok(backend.clone());
        }

        let backend = match self.locator {
            Some(ref locator) => Backend::validate(config, locator.as_ref()),
            None => Backend::validate(config, &NodeLocator::for_configuration(config)),
        }?;
        log::debug!("Validated the {} backend", backend.kind());
        *self.validated.lock() = Some((key, backend.clone()));
        Ok(backend)
    }

    async fn execute(&self, invocation: Invocation) -> Result<ClaudeResult> {
        let config = self.configuration();
        let backend = self.resolve(&config)?;
        let id = invocation.id();
        log::info!(
            "[{id}] {} via the {} backend ({})",
            invocation.method(),
            backend.kind(),
            invocation.output_format()
        );

        let target = backend.build_target(&invocation, &config)?;
        for warning in &target.warnings {
            log::warn!("[{id}] {warning}");
        }

        let info = backend.records_command_info().then(|| ExecutedCommandInfo {
            invocation_id: id,
            command_line: target.command_line(),
            working_directory: invocation
                .options()
                .cwd
                .clone()
                .or_else(|| config.working_directory.clone()),
            stdin: target.stdin.clone(),
            timestamp: Utc::now(),
            method: invocation.method(),
            backend: backend.kind(),
        });
        if config.debug
            && let Some(ref info) = info
        {
            log::debug!("[{id}] {}", info.command_line);
        }
        *self.last_executed.lock() = info;

        let cancel = self.call_token(invocation.options());
        let spec = target.into_launch_spec(&invocation, &config, cancel);
        backend.execute(&self.runner, spec, &invocation).await
    }

    /// Token for one call: cancelled by [`cancel`](Self::cancel) or by the
    /// caller's own token
    fn call_token(&self, options: &InvocationOptions) -> CancellationToken {
        let token = self.shutdown.lock().child_token();
        if let Some(ref external) = options.cancellation {
            link_cancellation(external.clone(), token.clone());
        }
        token
    }
}
