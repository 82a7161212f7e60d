//! Message codec
//!
//! Inbound: newline-delimited JSON records decoded into [`Message`] values,
//! one line at a time ([`decode_line`]) or from fully collected output
//! ([`decode_buffered`]).
//!
//! Outbound: an [`Invocation`] encoded into the form the active backend
//! consumes ([`encode_invocation`]): CLI flags or a single bridge request.
//!
//! [`Message`]: crate::types::Message
//! [`Invocation`]: crate::types::Invocation

mod args;
mod buffered;
mod encode;
mod parser;
mod payload;

pub use buffered::decode_buffered;
pub use encode::{
    CapabilityAction, CapabilityWarning, EncodedInvocation, InvocationPayload, encode_invocation,
};
pub use parser::{decode_line, parse_message};
pub use payload::{BridgeOptions, BridgeRequest, BridgeSystemPrompt};
