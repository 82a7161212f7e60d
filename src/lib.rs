//! # Claude Code client for Rust
//!
//! Runs prompts through the Claude Code CLI, or through the Claude Agent SDK
//! driven by a small Node.js bridge, and hands back the result as text, a
//! JSON document, or a live stream of typed messages.
//!
//! ## Quick Start
//!
//! ```no_run
//! use claude_code_client::{ClaudeCodeClient, Configuration, InvocationOptions, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClaudeCodeClient::new(Configuration::default());
//!     let result = client
//!         .run_single_prompt("What is 2 + 2?", OutputFormat::Text, InvocationOptions::default())
//!         .await?;
//!     log::info!("Claude: {}", result.as_text().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Core Features
//!
//! ### 1. Live streaming
//!
//! `stream-json` output arrives as a [`MessageStream`] that reads one line
//! from the process each time it is polled. Dropping the stream stops the
//! process.
//!
//! ```no_run
//! # use claude_code_client::{ClaudeCodeClient, Configuration, InvocationOptions, Message, OutputFormat};
//! # use futures::StreamExt;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeCodeClient::new(Configuration::default());
//! let options = InvocationOptions::builder()
//!     .max_turns(3)
//!     .allowed_tools(["Read", "Grep"])
//!     .timeout(std::time::Duration::from_secs(120))
//!     .build();
//!
//! let result = client
//!     .run_single_prompt("Summarize src/lib.rs", OutputFormat::StreamJson, options)
//!     .await?;
//! let mut stream = result.into_stream().ok_or("expected a stream")?;
//! while let Some(message) = stream.next().await {
//!     match message? {
//!         Message::Assistant { message, .. } => log::info!("{}", message.text()),
//!         Message::Result { total_cost_usd, .. } => log::info!("cost: {total_cost_usd:?}"),
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. Conversations
//!
//! ```no_run
//! # use claude_code_client::{ClaudeCodeClient, Configuration, InvocationOptions, OutputFormat};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeCodeClient::new(Configuration::default());
//! client
//!     .continue_conversation(Some("And now in French".into()), OutputFormat::Text, InvocationOptions::default())
//!     .await?;
//! client
//!     .resume_conversation("3f1c9a2e", None, OutputFormat::Json, InvocationOptions::default())
//!     .await?;
//! for session in client.list_sessions().await? {
//!     log::info!("{} ({})", session.id, session.modified);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. Backends
//!
//! ```no_run
//! # use claude_code_client::{BackendKind, ClaudeCodeClient, Configuration};
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ClaudeCodeClient::new(Configuration::default());
//! // Rejected, and the client stays on the CLI backend, if Node.js or the
//! // SDK package cannot be found
//! client.set_backend(BackendKind::BridgedRuntime)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`]: the orchestrator; one invocation per call
//! - [`backend`]: direct CLI and bridged runtime behind one contract
//! - [`transport`]: process spawning, deadlines, cancellation, termination
//! - [`stream`]: live and collected message streams
//! - [`message`]: line decoding and backend-specific encoding
//! - [`types`]: configuration, options, invocations, messages
//! - [`error`]: error taxonomy
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, ClaudeError>`](Result).
//! Validation errors ([`ClaudeError::is_validation`]) are raised before any
//! process starts; runtime errors ([`ClaudeError::is_runtime`]) are raised
//! only after the process has been reaped.
//!
//! ```no_run
//! # use claude_code_client::{ClaudeCodeClient, ClaudeError, Configuration, InvocationOptions, OutputFormat};
//! # async fn example() {
//! # let client = ClaudeCodeClient::new(Configuration::default());
//! match client.run_single_prompt("Hello", OutputFormat::Text, InvocationOptions::default()).await {
//!     Ok(_result) => { /* ... */ }
//!     Err(ClaudeError::NotInstalled(msg)) => log::error!("Claude Code not installed: {msg}"),
//!     Err(ClaudeError::ExecutionFailed { exit_code, stderr, .. }) => {
//!         log::error!("exit {exit_code:?}: {stderr}");
//!     }
//!     Err(e) => log::error!("Error: {e}"),
//! }
//! # }
//! ```
//!
//! ## Requirements
//!
//! - Claude Code: `npm install -g @anthropic-ai/claude-code`
//! - For the bridged backend: Node.js and `npm install -g @anthropic-ai/claude-agent-sdk`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod client;
pub mod error;
pub mod message;
pub mod stream;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use backend::{Backend, BackendCapabilities, BackendKind, NodeLocator, OutputFormats, RuntimeLocator};
pub use client::ClaudeCodeClient;
pub use error::{ClaudeError, Result};
pub use message::{CapabilityWarning, decode_buffered, decode_line, encode_invocation, parse_message};
pub use stream::MessageStream;
pub use transport::{LaunchSpec, ProcessHandle, ProcessRunner};

// Re-export type submodules for flat public API
pub use types::configuration::{Configuration, ConfigurationBuilder};
pub use types::diagnostics::{ExecutedCommandInfo, SessionInfo};
pub use types::identifiers::{SessionId, ToolName};
pub use types::invocation::{ExecutionMethod, Invocation, PromptSource, SessionDirective};
pub use types::mcp::{McpRemoteServerConfig, McpServerConfig, McpServers, McpStdioServerConfig};
pub use types::messages::{ContentBlock, ContentValue, Message, UserContent};
pub use types::options::{InvocationOptions, InvocationOptionsBuilder, SystemPrompt};
pub use types::output::{ClaudeResult, OutputFormat, StreamDelivery};
pub use types::permissions::PermissionMode;

/// Version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
