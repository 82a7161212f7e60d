//! MCP (Model Context Protocol) server configuration types
//!
//! Both backends accept the same server descriptors. The CLI receives them as
//! an `--mcp-config` JSON document, the Agent SDK as the `mcpServers` option.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// MCP stdio server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpStdioServerConfig {
    /// Command to execute
    pub command: String,
    /// Command arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Remote (SSE or HTTP) MCP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpRemoteServerConfig {
    /// Server URL
    pub url: String,
    /// HTTP headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// MCP server configuration, tagged by transport the way both backends expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpServerConfig {
    /// Stdio-based MCP server
    Stdio(McpStdioServerConfig),
    /// Server-sent events MCP server
    Sse(McpRemoteServerConfig),
    /// HTTP-based MCP server
    Http(McpRemoteServerConfig),
}

impl McpServerConfig {
    /// Stdio server shorthand
    pub fn stdio<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Stdio(McpStdioServerConfig {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: BTreeMap::new(),
        })
    }
}

/// MCP servers container
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum McpServers {
    /// No MCP servers
    #[default]
    None,
    /// Inline server descriptors keyed by server name
    Servers(BTreeMap<String, McpServerConfig>),
    /// Path to an MCP configuration file
    ConfigFile(PathBuf),
}

impl McpServers {
    /// Whether nothing is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Servers(servers) => servers.is_empty(),
            Self::ConfigFile(_) => false,
        }
    }

    /// `{"mcpServers": {...}}` document for inline servers
    #[must_use]
    pub fn to_config_document(servers: &BTreeMap<String, McpServerConfig>) -> serde_json::Value {
        serde_json::json!({ "mcpServers": servers })
    }
}
