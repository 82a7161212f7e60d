//! `ClaudeCodeClient`: the session and continuation orchestrator
//!
//! The client owns the configuration, validates it into a [`Backend`], and
//! turns each public operation into one [`Invocation`]:
//!
//! | Operation                  | Directive      | Prompt delivery |
//! |----------------------------|----------------|-----------------|
//! | `run_single_prompt`        | new session    | inline          |
//! | `run_with_stdin`           | new session    | standard input  |
//! | `continue_conversation`    | continue last  | inline, optional|
//! | `resume_conversation`      | resume by id   | inline, optional|
//!
//! Every call works on the configuration snapshot taken when it starts, so
//! [`ClaudeCodeClient::update_configuration`] never affects a call already
//! in flight. Calls may run concurrently; each owns its own process.
//!
//! # Example
//!
//! ```no_run
//! use claude_code_client::{ClaudeCodeClient, Configuration, InvocationOptions, OutputFormat};
//! use futures::StreamExt;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeCodeClient::new(Configuration::default());
//! client.validate()?;
//!
//! let result = client
//!     .run_single_prompt("What is 2 + 2?", OutputFormat::StreamJson, InvocationOptions::default())
//!     .await?;
//!
//! if let Some(mut stream) = result.into_stream() {
//!     while let Some(message) = stream.next().await {
//!         let message = message?;
//!         if let Some(text) = message.final_text() {
//!             println!("{text}");
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Diagnostics
//!
//! [`ClaudeCodeClient::last_executed_command_info`] returns the command line
//! of the most recent call. The slot is shared: with concurrent calls the
//! last one to start wins, so read it right after the call you care about.
//!
//! [`Backend`]: crate::backend::Backend
//! [`Invocation`]: crate::types::Invocation

mod client_impl;
pub(crate) mod sessions;
mod tasks;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, RuntimeLocator, ValidationKey};
use crate::transport::ProcessRunner;
use crate::types::configuration::Configuration;
use crate::types::diagnostics::ExecutedCommandInfo;

/// Client for running prompts through the Claude Code CLI or the Agent SDK
pub struct ClaudeCodeClient {
    config: RwLock<Configuration>,
    validated: Mutex<Option<(ValidationKey, Backend)>>,
    last_executed: Mutex<Option<ExecutedCommandInfo>>,
    runner: ProcessRunner,
    shutdown: Mutex<CancellationToken>,
    locator: Option<Arc<dyn RuntimeLocator>>,
}

impl std::fmt::Debug for ClaudeCodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeCodeClient")
            .field("config", &*self.config.read())
            .field("processes_spawned", &self.runner.processes_spawned())
            .finish_non_exhaustive()
    }
}
