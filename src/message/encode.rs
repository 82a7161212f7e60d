//! Outbound encoding: invocation to backend-specific payload

use std::fmt;

use crate::backend::BackendKind;
use crate::types::invocation::{Invocation, PromptSource};

use super::args::ArgsBuilder;
use super::payload::BridgeRequest;

/// An option a backend could not pass through unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityWarning {
    /// Option name as the caller knows it
    pub option: &'static str,
    /// Whether the option was translated or dropped
    pub action: CapabilityAction,
    /// Human-readable detail
    pub detail: String,
}

/// What happened to an unsupported option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityAction {
    /// Mapped to the nearest equivalent
    Translated,
    /// Not sent at all
    Dropped,
}

impl CapabilityWarning {
    pub(crate) fn translated(option: &'static str, detail: impl Into<String>) -> Self {
        Self {
            option,
            action: CapabilityAction::Translated,
            detail: detail.into(),
        }
    }

    pub(crate) fn dropped(option: &'static str, detail: impl Into<String>) -> Self {
        Self {
            option,
            action: CapabilityAction::Dropped,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for CapabilityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            CapabilityAction::Translated => "translated",
            CapabilityAction::Dropped => "dropped",
        };
        write!(f, "option '{}' {action}: {}", self.option, self.detail)
    }
}

/// Backend-specific form of an invocation
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationPayload {
    /// Ordered CLI flags; the inline prompt goes last, after `--`
    Arguments {
        /// Flags in emission order
        flags: Vec<String>,
        /// Prompt passed as the trailing positional argument
        prompt: Option<String>,
    },
    /// One structured request passed as the bridge's only argument
    Bridge(BridgeRequest),
}

impl InvocationPayload {
    /// Final argument vector; `suffix` lands after the flags, before the prompt
    ///
    /// # Errors
    /// Fails only if the bridge request cannot be serialized
    pub fn to_args(&self, suffix: &[String]) -> serde_json::Result<Vec<String>> {
        match self {
            Self::Arguments { flags, prompt } => {
                let mut args = flags.clone();
                args.extend(suffix.iter().cloned());
                if let Some(prompt) = prompt {
                    args.push("--".to_string());
                    args.push(prompt.clone());
                }
                Ok(args)
            }
            Self::Bridge(request) => {
                let mut args = vec![serde_json::to_string(request)?];
                args.extend(suffix.iter().cloned());
                Ok(args)
            }
        }
    }
}

/// Encoded invocation plus everything it needs besides arguments
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedInvocation {
    /// Arguments or bridge request
    pub payload: InvocationPayload,
    /// Content for standard input
    pub stdin: Option<String>,
    /// Options that were translated or dropped
    pub warnings: Vec<CapabilityWarning>,
}

/// Encode an invocation for the given backend
///
/// Options the backend cannot express are translated to their nearest
/// equivalent or dropped; either way a [`CapabilityWarning`] is recorded so
/// the change in meaning is visible.
#[must_use]
pub fn encode_invocation(invocation: &Invocation, backend: BackendKind) -> EncodedInvocation {
    match backend {
        BackendKind::DirectCli => {
            let (flags, prompt, warnings) = ArgsBuilder::new(invocation).build();
            let stdin = match invocation.prompt() {
                PromptSource::Stdin(text) => Some(text.clone()),
                PromptSource::Inline(_) | PromptSource::None => None,
            };
            EncodedInvocation {
                payload: InvocationPayload::Arguments { flags, prompt },
                stdin,
                warnings,
            }
        }
        BackendKind::BridgedRuntime => {
            let (request, warnings) = BridgeRequest::from_invocation(invocation);
            EncodedInvocation {
                payload: InvocationPayload::Bridge(request),
                stdin: None,
                warnings,
            }
        }
    }
}
