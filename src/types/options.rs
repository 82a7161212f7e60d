//! Per-call invocation options
//!
//! [`InvocationOptions`] is the option set of a single call. Each backend
//! encodes it into its own form (CLI flags or the SDK options object); see
//! [`crate::message::encode_invocation`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::identifiers::ToolName;
use super::mcp::{McpServerConfig, McpServers};
use super::output::StreamDelivery;
use super::permissions::PermissionMode;

// ============================================================================
// System Prompt
// ============================================================================

/// System prompt configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "text", rename_all = "lowercase")]
pub enum SystemPrompt {
    /// Replace the default system prompt
    Replace(String),
    /// Append to the default system prompt
    Append(String),
}

impl From<String> for SystemPrompt {
    fn from(s: String) -> Self {
        Self::Replace(s)
    }
}

impl From<&str> for SystemPrompt {
    fn from(s: &str) -> Self {
        Self::Replace(s.to_string())
    }
}

// ============================================================================
// Invocation Options
// ============================================================================

/// Options for one call
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// AI model to use
    pub model: Option<String>,
    /// Maximum number of turns before stopping
    pub max_turns: Option<u32>,
    /// Extended thinking budget
    pub max_thinking_tokens: Option<u32>,
    /// Tools Claude is allowed to use
    pub allowed_tools: Vec<ToolName>,
    /// Tools Claude is not allowed to use
    pub disallowed_tools: Vec<ToolName>,
    /// Permission mode for tool execution
    pub permission_mode: Option<PermissionMode>,
    /// MCP tool that answers permission prompts
    pub permission_prompt_tool_name: Option<String>,
    /// System prompt configuration
    pub system_prompt: Option<SystemPrompt>,
    /// MCP server configurations
    pub mcp_servers: McpServers,
    /// Working directory for this call; overrides the client configuration
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for this call
    pub env: BTreeMap<String, String>,
    /// Fork into a new session when resuming
    pub fork_session: bool,
    /// Resume from a specific message of the resumed session
    pub resume_session_at: Option<String>,
    /// Emit partial message stream events
    pub include_partial_messages: bool,
    /// Deadline for the whole invocation
    pub timeout: Option<Duration>,
    /// Live or collected delivery for `stream-json`
    pub delivery: StreamDelivery,
    /// Caller-owned cancellation token for this call
    pub cancellation: Option<CancellationToken>,
}

impl InvocationOptions {
    /// Create a new builder for `InvocationOptions`
    #[must_use]
    pub fn builder() -> InvocationOptionsBuilder {
        InvocationOptionsBuilder::default()
    }
}

// ============================================================================
// Builder for InvocationOptions
// ============================================================================

/// Builder for `InvocationOptions`
#[derive(Debug, Default)]
pub struct InvocationOptionsBuilder {
    options: InvocationOptions,
}

impl InvocationOptionsBuilder {
    /// Set model
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    /// Set max turns
    #[must_use]
    pub const fn max_turns(mut self, turns: u32) -> Self {
        self.options.max_turns = Some(turns);
        self
    }

    /// Set extended thinking budget
    #[must_use]
    pub const fn max_thinking_tokens(mut self, tokens: u32) -> Self {
        self.options.max_thinking_tokens = Some(tokens);
        self
    }

    /// Set allowed tools
    #[must_use]
    pub fn allowed_tools<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ToolName>,
    {
        self.options.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set disallowed tools
    #[must_use]
    pub fn disallowed_tools<I, T>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ToolName>,
    {
        self.options.disallowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Set permission mode
    #[must_use]
    pub const fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.options.permission_mode = Some(mode);
        self
    }

    /// Set permission prompt tool
    #[must_use]
    pub fn permission_prompt_tool_name(mut self, tool: impl Into<String>) -> Self {
        self.options.permission_prompt_tool_name = Some(tool.into());
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<SystemPrompt>) -> Self {
        self.options.system_prompt = Some(prompt.into());
        self
    }

    /// Append to the default system prompt
    #[must_use]
    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.options.system_prompt = Some(SystemPrompt::Append(prompt.into()));
        self
    }

    /// Set inline MCP servers
    #[must_use]
    pub fn mcp_servers(mut self, servers: BTreeMap<String, McpServerConfig>) -> Self {
        self.options.mcp_servers = McpServers::Servers(servers);
        self
    }

    /// Use an MCP configuration file
    #[must_use]
    pub fn mcp_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.mcp_servers = McpServers::ConfigFile(path.into());
        self
    }

    /// Set working directory
    #[must_use]
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    /// Add an environment variable
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Fork the session when resuming
    #[must_use]
    pub const fn fork_session(mut self, fork: bool) -> Self {
        self.options.fork_session = fork;
        self
    }

    /// Resume at a specific message
    #[must_use]
    pub fn resume_session_at(mut self, message_id: impl Into<String>) -> Self {
        self.options.resume_session_at = Some(message_id.into());
        self
    }

    /// Emit partial message events
    #[must_use]
    pub const fn include_partial_messages(mut self, include: bool) -> Self {
        self.options.include_partial_messages = include;
        self
    }

    /// Set the invocation deadline
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set `stream-json` delivery
    #[must_use]
    pub const fn delivery(mut self, delivery: StreamDelivery) -> Self {
        self.options.delivery = delivery;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.options.cancellation = Some(token);
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> InvocationOptions {
        self.options
    }
}
