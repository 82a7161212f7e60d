//! Message parser for stream-json output

use crate::error::{ClaudeError, Result};
use crate::types::messages::Message;

/// Longest excerpt of an offending line kept in a decode error
const MAX_ERROR_EXCERPT: usize = 512;

/// Parse a JSON value into a typed Message
///
/// # Errors
/// Returns `ClaudeError::Decode` if the value has no recognized `type` tag or
/// does not match the shape of that message kind
pub fn parse_message(data: serde_json::Value) -> Result<Message> {
    let kind = match data.get("type") {
        Some(serde_json::Value::String(kind)) => kind.clone(),
        Some(_) => return Err(ClaudeError::decode("'type' tag is not a string", None)),
        None => return Err(ClaudeError::decode("record has no 'type' tag", None)),
    };
    serde_json::from_value(data)
        .map_err(|e| ClaudeError::decode(format!("unrecognized or malformed '{kind}' record: {e}"), None))
}

/// Decode one newline-delimited record
///
/// Surrounding whitespace is ignored. Whether a failure is fatal is up to
/// the caller: buffered decoding fails the call, live streams skip the line.
///
/// # Errors
/// Returns `ClaudeError::Decode` for invalid UTF-8, invalid JSON, a missing
/// or unknown `type` tag, or a record that does not fit its kind
pub fn decode_line(bytes: &[u8]) -> Result<Message> {
    let line = std::str::from_utf8(bytes)
        .map_err(|e| ClaudeError::decode(format!("line is not valid UTF-8: {e}"), None))?
        .trim();

    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        ClaudeError::decode(format!("line is not valid JSON: {e}"), Some(excerpt(line)))
    })?;

    parse_message(value).map_err(|e| match e {
        ClaudeError::Decode { message, .. } => ClaudeError::decode(message, Some(excerpt(line))),
        other => other,
    })
}

fn excerpt(line: &str) -> String {
    if line.len() <= MAX_ERROR_EXCERPT {
        return line.to_string();
    }
    let mut end = MAX_ERROR_EXCERPT;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &line[..end])
}
