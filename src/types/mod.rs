//! Type definitions for the Claude Code client
//!
//! This module contains the data model used throughout the crate,
//! organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe ID wrappers (`SessionId`, `ToolName`)
//! - [`permissions`] - Permission modes
//! - [`mcp`] - MCP server configuration
//! - [`messages`] - Message and content block types
//! - [`options`] - Per-call invocation options
//! - [`output`] - Output formats and call results
//! - [`invocation`] - The immutable invocation description
//! - [`configuration`] - Client-wide configuration
//! - [`diagnostics`] - Executed-command snapshots and session records

pub mod configuration;
pub mod diagnostics;
pub mod identifiers;
pub mod invocation;
pub mod mcp;
pub mod messages;
pub mod options;
pub mod output;
pub mod permissions;

// Re-export commonly used types
pub use configuration::{Configuration, ConfigurationBuilder};
pub use diagnostics::{ExecutedCommandInfo, SessionInfo};
pub use identifiers::{SessionId, ToolName};
pub use invocation::{ExecutionMethod, Invocation, PromptSource, SessionDirective};
pub use mcp::{McpRemoteServerConfig, McpServerConfig, McpServers, McpStdioServerConfig};
pub use messages::{
    AssistantMessageContent, ContentBlock, ContentValue, ErrorDetail, ErrorPayload, Message,
    UserContent, UserMessageContent,
};
pub use options::{InvocationOptions, InvocationOptionsBuilder, SystemPrompt};
pub use output::{ClaudeResult, OutputFormat, StreamDelivery};
pub use permissions::PermissionMode;
