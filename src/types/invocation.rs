//! Invocation: the immutable description of one execution request

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identifiers::SessionId;
use super::options::InvocationOptions;
use super::output::OutputFormat;
use crate::error::{ClaudeError, Result};

/// Which client operation produced an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionMethod {
    /// Fresh prompt, no continuation
    RunSinglePrompt,
    /// Continue the most recent conversation
    ContinueConversation,
    /// Resume a conversation by session id
    ResumeConversation,
    /// Prompt delivered on standard input
    RunWithStdin,
    /// Session enumeration
    ListSessions,
}

impl ExecutionMethod {
    /// Stable name used in logs and diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunSinglePrompt => "runSinglePrompt",
            Self::ContinueConversation => "continueConversation",
            Self::ResumeConversation => "resumeConversation",
            Self::RunWithStdin => "runWithStdin",
            Self::ListSessions => "listSessions",
        }
    }
}

impl fmt::Display for ExecutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session continuation requested by an invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionDirective {
    /// Start a new session
    #[default]
    New,
    /// Continue the most recent session in the working directory
    ContinueLast,
    /// Resume the given session
    Resume(SessionId),
}

/// Where the prompt text travels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// No prompt (continue/resume without a new message)
    None,
    /// Passed inline as an argument or payload field
    Inline(String),
    /// Written to the process standard input
    Stdin(String),
}

impl PromptSource {
    /// Prompt text regardless of delivery channel
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Inline(text) | Self::Stdin(text) => Some(text),
        }
    }
}

/// One fully specified request; built once per call and never mutated
#[derive(Debug, Clone)]
pub struct Invocation {
    id: Uuid,
    method: ExecutionMethod,
    prompt: PromptSource,
    output_format: OutputFormat,
    directive: SessionDirective,
    options: InvocationOptions,
}

impl Invocation {
    /// Fresh prompt with no continuation directive
    pub fn single_prompt(
        prompt: impl Into<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Self {
        Self::build(
            ExecutionMethod::RunSinglePrompt,
            PromptSource::Inline(prompt.into()),
            output_format,
            SessionDirective::New,
            options,
        )
    }

    /// Prompt delivered on standard input
    pub fn with_stdin(
        stdin: impl Into<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Self {
        Self::build(
            ExecutionMethod::RunWithStdin,
            PromptSource::Stdin(stdin.into()),
            output_format,
            SessionDirective::New,
            options,
        )
    }

    /// Continue the most recent conversation
    #[must_use]
    pub fn continue_last(
        prompt: Option<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Self {
        Self::build(
            ExecutionMethod::ContinueConversation,
            prompt.map_or(PromptSource::None, PromptSource::Inline),
            output_format,
            SessionDirective::ContinueLast,
            options,
        )
    }

    /// Resume a conversation by id
    ///
    /// # Errors
    /// Returns `ClaudeError::InvalidConfig` if the session id is blank
    pub fn resume(
        session_id: impl Into<SessionId>,
        prompt: Option<String>,
        output_format: OutputFormat,
        options: InvocationOptions,
    ) -> Result<Self> {
        let session_id = session_id.into();
        if session_id.is_blank() {
            return Err(ClaudeError::invalid_config(
                "resumeConversation requires a non-empty session id",
            ));
        }
        Ok(Self::build(
            ExecutionMethod::ResumeConversation,
            prompt.map_or(PromptSource::None, PromptSource::Inline),
            output_format,
            SessionDirective::Resume(session_id),
            options,
        ))
    }

    fn build(
        method: ExecutionMethod,
        prompt: PromptSource,
        output_format: OutputFormat,
        directive: SessionDirective,
        options: InvocationOptions,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            prompt,
            output_format,
            directive,
            options,
        }
    }

    /// Correlation id for logs and diagnostics
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Operation that produced this invocation
    #[must_use]
    pub const fn method(&self) -> ExecutionMethod {
        self.method
    }

    /// Prompt and its delivery channel
    #[must_use]
    pub const fn prompt(&self) -> &PromptSource {
        &self.prompt
    }

    /// Requested output format
    #[must_use]
    pub const fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Session continuation directive
    #[must_use]
    pub const fn directive(&self) -> &SessionDirective {
        &self.directive
    }

    /// Option set
    #[must_use]
    pub const fn options(&self) -> &InvocationOptions {
        &self.options
    }
}
