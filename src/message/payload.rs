//! JSON request encoding for the bridged runtime backend
//!
//! The bridge receives exactly one argument: `{ prompt, options }`, where
//! `options` uses the Agent SDK's own option names.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::ToolName;
use crate::types::invocation::{Invocation, PromptSource, SessionDirective};
use crate::types::mcp::{McpServerConfig, McpServers};
use crate::types::options::SystemPrompt;
use crate::types::permissions::PermissionMode;

use super::encode::CapabilityWarning;

/// Preset name the SDK uses for the Claude Code system prompt
const CLAUDE_CODE_PRESET: &str = "claude_code";

/// The single argument handed to the bridge program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Prompt text (empty when continuing without a new message)
    pub prompt: String,
    /// SDK options
    pub options: BridgeOptions,
}

/// Agent SDK `query()` options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeOptions {
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Turn limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<u32>,
    /// Extended thinking budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_thinking_tokens: Option<u32>,
    /// Tool allow-list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Tool deny-list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disallowed_tools: Option<Vec<String>>,
    /// Permission mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<PermissionMode>,
    /// MCP tool answering permission prompts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_prompt_tool_name: Option<String>,
    /// Session to resume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    /// Continue the most recent session
    #[serde(
        default,
        rename = "continue",
        skip_serializing_if = "Option::is_none"
    )]
    pub continue_conversation: Option<bool>,
    /// System prompt override or preset append
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<BridgeSystemPrompt>,
    /// Inline MCP servers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<BTreeMap<String, McpServerConfig>>,
    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Fork when resuming
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_session: Option<bool>,
    /// Message id to resume at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_session_at: Option<String>,
    /// Emit `stream_event` records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_partial_messages: Option<bool>,
}

/// SDK system prompt: a replacement string or the preset with an append
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeSystemPrompt {
    /// Replace the default prompt
    Text(String),
    /// `{ type: "preset", preset: "claude_code", append }`
    Preset {
        /// Always `"preset"`
        #[serde(rename = "type")]
        kind: String,
        /// Preset name
        preset: String,
        /// Text appended to the preset
        append: String,
    },
}

impl From<&SystemPrompt> for BridgeSystemPrompt {
    fn from(prompt: &SystemPrompt) -> Self {
        match prompt {
            SystemPrompt::Replace(text) => Self::Text(text.clone()),
            SystemPrompt::Append(text) => Self::Preset {
                kind: "preset".to_string(),
                preset: CLAUDE_CODE_PRESET.to_string(),
                append: text.clone(),
            },
        }
    }
}

impl BridgeRequest {
    /// Encode an invocation, collecting warnings for translated options
    pub(crate) fn from_invocation(invocation: &Invocation) -> (Self, Vec<CapabilityWarning>) {
        let mut warnings = Vec::new();
        let options = invocation.options();

        let prompt = match invocation.prompt() {
            PromptSource::Inline(text) => text.clone(),
            PromptSource::Stdin(text) => {
                warnings.push(CapabilityWarning::translated(
                    "stdin",
                    "the bridge takes a single argument; stdin content is sent as the prompt",
                ));
                text.clone()
            }
            PromptSource::None => String::new(),
        };

        let (resume, continue_conversation) = match invocation.directive() {
            SessionDirective::New => (None, None),
            SessionDirective::ContinueLast => (None, Some(true)),
            SessionDirective::Resume(id) => (Some(id.as_str().to_string()), None),
        };

        let mcp_servers = match &options.mcp_servers {
            McpServers::Servers(servers) if !servers.is_empty() => Some(servers.clone()),
            McpServers::ConfigFile(path) => {
                warnings.push(CapabilityWarning::dropped(
                    "mcpConfig",
                    format!(
                        "the SDK takes inline servers only; {} was not loaded",
                        path.display()
                    ),
                ));
                None
            }
            McpServers::Servers(_) | McpServers::None => None,
        };

        let tool_list = |tools: &[ToolName]| -> Option<Vec<String>> {
            (!tools.is_empty()).then(|| tools.iter().map(|t| t.as_str().to_string()).collect())
        };

        let request = Self {
            prompt,
            options: BridgeOptions {
                model: options.model.clone(),
                max_turns: options.max_turns,
                max_thinking_tokens: options.max_thinking_tokens,
                allowed_tools: tool_list(&options.allowed_tools),
                disallowed_tools: tool_list(&options.disallowed_tools),
                permission_mode: options.permission_mode,
                permission_prompt_tool_name: options.permission_prompt_tool_name.clone(),
                resume,
                continue_conversation,
                system_prompt: options.system_prompt.as_ref().map(BridgeSystemPrompt::from),
                mcp_servers,
                cwd: options.cwd.clone(),
                fork_session: options.fork_session.then_some(true),
                resume_session_at: options.resume_session_at.clone(),
                include_partial_messages: options.include_partial_messages.then_some(true),
            },
        };

        (request, warnings)
    }
}
