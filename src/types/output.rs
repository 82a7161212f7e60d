//! Output formats and call results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stream::MessageStream;

/// Output format requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Plain text, returned verbatim
    #[default]
    Text,
    /// A single JSON document
    Json,
    /// Newline-delimited JSON messages
    StreamJson,
}

impl OutputFormat {
    /// Spelling used by `--output-format`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::StreamJson => "stream-json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a `stream-json` result is handed to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamDelivery {
    /// Messages are pulled from the process as the caller polls
    #[default]
    Live,
    /// The call returns after the process exits with every message decoded
    Collected,
}

/// Outcome of one call; the variant follows the requested output format
#[derive(Debug)]
pub enum ClaudeResult {
    /// `text` output, verbatim
    Text(String),
    /// `json` output, one structured value
    Json(serde_json::Value),
    /// `stream-json` output, live or already collected
    Stream(MessageStream),
}

impl ClaudeResult {
    /// Text output, if this is a text result
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON output, if this is a json result
    #[must_use]
    pub const fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Take the message stream, if this is a stream result
    #[must_use]
    pub fn into_stream(self) -> Option<MessageStream> {
        match self {
            Self::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}
