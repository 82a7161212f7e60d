//! Message-related type definitions
//!
//! One [`Message`] is decoded from each newline-delimited JSON record that the
//! CLI (`--output-format stream-json`) or the SDK bridge writes to stdout.

use super::identifiers::SessionId;
use serde::{Deserialize, Serialize};

// ============================================================================
// Content Blocks
// ============================================================================

/// Content value for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    /// String content
    String(String),
    /// Structured content blocks
    Blocks(Vec<serde_json::Value>),
}

/// Content block types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content block
    Text {
        /// Text content
        text: String,
    },
    /// Thinking content block (extended thinking)
    Thinking {
        /// Thinking content
        thinking: String,
        /// Signature for verification
        #[serde(default)]
        signature: String,
    },
    /// Tool use request
    ToolUse {
        /// Tool use ID
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters
        input: serde_json::Value,
    },
    /// Tool execution result
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Result content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<ContentValue>,
        /// Whether this is an error result
        #[serde(default, skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
    /// Block kinds this client does not model (images, redacted thinking, ...)
    #[serde(other)]
    Other,
}

/// User message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserMessageContent {
    /// Message role (always "user")
    #[serde(default = "user_role")]
    pub role: String,
    /// Message content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<UserContent>,
}

fn user_role() -> String {
    "user".to_string()
}

/// User content can be string or blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Plain string content
    String(String),
    /// Structured content blocks
    Blocks(Vec<ContentBlock>),
}

/// Assistant message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessageContent {
    /// Model that generated the message
    #[serde(default)]
    pub model: String,
    /// Message content blocks
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Stop reason reported by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// Token usage for this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

impl AssistantMessageContent {
    /// Concatenated text of all text blocks
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

// ============================================================================
// Error payloads
// ============================================================================

/// Structured error object written by the bridge on internal failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error message
    pub message: String,
    /// JavaScript stack, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Error class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `error` field of an error record: either an object or a bare string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// `{ message, stack, name }`
    Detail(ErrorDetail),
    /// Plain message
    Text(String),
}

// ============================================================================
// Message
// ============================================================================

/// One decoded stream record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// System message; `subtype == "init"` opens every session
    System {
        /// System message subtype
        subtype: String,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Remaining fields (model, tools, cwd, ...)
        #[serde(flatten)]
        data: serde_json::Map<String, serde_json::Value>,
    },
    /// Assistant turn
    Assistant {
        /// Message content
        message: AssistantMessageContent,
        /// Parent tool use ID for nested conversations
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// User turn (includes tool results fed back to the model)
    User {
        /// Message content
        message: UserMessageContent,
        /// Parent tool use ID for nested conversations
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Standalone tool use record
    ToolUse {
        /// Tool use ID
        id: String,
        /// Tool name
        name: String,
        /// Tool input parameters
        #[serde(default)]
        input: serde_json::Value,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Standalone tool result record
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Result content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<ContentValue>,
        /// Whether this is an error result
        #[serde(default)]
        is_error: bool,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Final result message with metrics
    Result {
        /// `success` or one of the `error_*` subtypes
        subtype: String,
        /// Whether this is an error result
        #[serde(default)]
        is_error: bool,
        /// Total duration in milliseconds
        #[serde(default)]
        duration_ms: u64,
        /// API call duration in milliseconds
        #[serde(default)]
        duration_api_ms: u64,
        /// Number of conversation turns
        #[serde(default)]
        num_turns: u32,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Total cost in USD
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_cost_usd: Option<f64>,
        /// Token usage statistics
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<serde_json::Value>,
        /// Final text (present on success)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    /// Error record
    Error {
        /// Structured error
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorPayload>,
        /// Top-level message, used by some emitters instead of `error`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Stream event for partial messages
    StreamEvent {
        /// Raw stream event data
        event: serde_json::Value,
        /// Event UUID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uuid: Option<String>,
        /// Session ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        /// Parent tool use ID
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },
}

impl Message {
    /// Wire `type` tag of this message
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::Assistant { .. } => "assistant",
            Self::User { .. } => "user",
            Self::ToolUse { .. } => "tool_use",
            Self::ToolResult { .. } => "tool_result",
            Self::Result { .. } => "result",
            Self::Error { .. } => "error",
            Self::StreamEvent { .. } => "stream_event",
        }
    }

    /// Session this message belongs to, when the record carries one
    #[must_use]
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Self::System { session_id, .. }
            | Self::Assistant { session_id, .. }
            | Self::User { session_id, .. }
            | Self::ToolUse { session_id, .. }
            | Self::ToolResult { session_id, .. }
            | Self::Result { session_id, .. }
            | Self::StreamEvent { session_id, .. } => session_id.as_ref(),
            Self::Error { .. } => None,
        }
    }

    /// Whether this is the `system/init` record
    #[must_use]
    pub fn is_init(&self) -> bool {
        matches!(self, Self::System { subtype, .. } if subtype == "init")
    }

    /// Whether this is a terminal `result` record
    #[must_use]
    pub const fn is_result(&self) -> bool {
        matches!(self, Self::Result { .. })
    }

    /// Final text of a successful `result` record
    #[must_use]
    pub fn final_text(&self) -> Option<&str> {
        match self {
            Self::Result { result, .. } => result.as_deref(),
            _ => None,
        }
    }

    /// Aggregate cost of a `result` record
    #[must_use]
    pub fn cost_usd(&self) -> Option<f64> {
        match self {
            Self::Result { total_cost_usd, .. } => *total_cost_usd,
            _ => None,
        }
    }

    /// Error text carried by an `error` record or a failed `result` record
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Error { error, message } => match (error, message) {
                (Some(ErrorPayload::Detail(detail)), _) => Some(detail.message.clone()),
                (Some(ErrorPayload::Text(text)), _) => Some(text.clone()),
                (None, Some(message)) => Some(message.clone()),
                (None, None) => Some("unknown error".to_string()),
            },
            Self::Result {
                subtype,
                is_error: true,
                result,
                ..
            } => Some(result.clone().unwrap_or_else(|| subtype.clone())),
            _ => None,
        }
    }
}
