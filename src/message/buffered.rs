//! Decoding of fully collected process output

use crate::error::{ClaudeError, Result};
use crate::stream::MessageStream;
use crate::types::output::{ClaudeResult, OutputFormat};

use super::parser::decode_line;

/// Turn the complete stdout of a finished process into a result
///
/// - `text`: the output verbatim; bytes that are not valid UTF-8 become
///   U+FFFD instead of failing the call
/// - `json`: exactly one structured value
/// - `stream-json`: every non-blank line must decode; the messages come
///   back as an already completed stream
///
/// # Errors
/// Returns `ClaudeError::Decode` when the output does not fit the format
pub fn decode_buffered(format: OutputFormat, raw: &[u8]) -> Result<ClaudeResult> {
    match format {
        OutputFormat::Text => Ok(ClaudeResult::Text(String::from_utf8_lossy(raw).into_owned())),
        OutputFormat::Json => serde_json::from_slice(raw.trim_ascii())
            .map(ClaudeResult::Json)
            .map_err(|e| ClaudeError::decode(format!("json output is not a single JSON value: {e}"), None)),
        OutputFormat::StreamJson => {
            let messages = raw
                .split(|b| *b == b'\n')
                .filter(|line| !line.trim_ascii().is_empty())
                .map(decode_line)
                .collect::<Result<Vec<_>>>()?;
            Ok(ClaudeResult::Stream(MessageStream::completed(messages)))
        }
    }
}
