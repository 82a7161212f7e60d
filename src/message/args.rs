//! CLI argument encoding for the direct CLI backend

use crate::types::invocation::{Invocation, PromptSource, SessionDirective};
use crate::types::mcp::McpServers;
use crate::types::options::{InvocationOptions, SystemPrompt};
use crate::types::output::OutputFormat;

use super::encode::CapabilityWarning;

/// Builds the ordered flag list for `claude -p`
pub(crate) struct ArgsBuilder<'a> {
    invocation: &'a Invocation,
    args: Vec<String>,
    warnings: Vec<CapabilityWarning>,
}

impl<'a> ArgsBuilder<'a> {
    pub(crate) const fn new(invocation: &'a Invocation) -> Self {
        Self {
            invocation,
            args: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Flags plus the inline prompt, if the prompt travels as an argument
    pub(crate) fn build(mut self) -> (Vec<String>, Option<String>, Vec<CapabilityWarning>) {
        let invocation = self.invocation;
        let format = invocation.output_format();

        // Base arguments
        self.push("-p");
        self.flag("--output-format", format.as_str());
        if format == OutputFormat::StreamJson {
            // print mode refuses stream-json without --verbose
            self.push("--verbose");
        }

        let options = invocation.options();
        self.add_system_prompt_args(options);
        self.add_tool_args(options);
        self.add_configuration_args(options);
        self.add_session_args(options);
        self.add_mcp_args(options);

        let prompt = match invocation.prompt() {
            PromptSource::Inline(text) => Some(text.clone()),
            PromptSource::Stdin(_) | PromptSource::None => None,
        };

        (self.args, prompt, self.warnings)
    }

    fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn flag(&mut self, name: &str, value: impl Into<String>) {
        self.args.push(name.to_string());
        self.args.push(value.into());
    }

    fn add_system_prompt_args(&mut self, options: &InvocationOptions) {
        match &options.system_prompt {
            Some(SystemPrompt::Replace(text)) => self.flag("--system-prompt", text.as_str()),
            Some(SystemPrompt::Append(text)) => self.flag("--append-system-prompt", text.as_str()),
            None => {}
        }
    }

    /// Tool lists are comma-joined
    fn add_tool_args(&mut self, options: &InvocationOptions) {
        if !options.allowed_tools.is_empty() {
            let tools: Vec<&str> = options.allowed_tools.iter().map(|t| t.as_str()).collect();
            self.flag("--allowedTools", tools.join(","));
        }

        if !options.disallowed_tools.is_empty() {
            let tools: Vec<&str> = options.disallowed_tools.iter().map(|t| t.as_str()).collect();
            self.flag("--disallowedTools", tools.join(","));
        }
    }

    fn add_configuration_args(&mut self, options: &InvocationOptions) {
        if let Some(ref model) = options.model {
            self.flag("--model", model.as_str());
        }

        if let Some(max_turns) = options.max_turns {
            self.flag("--max-turns", max_turns.to_string());
        }

        if let Some(tokens) = options.max_thinking_tokens {
            self.flag("--max-thinking-tokens", tokens.to_string());
        }

        if let Some(mode) = options.permission_mode {
            self.flag("--permission-mode", mode.as_str());
        }

        if let Some(ref tool) = options.permission_prompt_tool_name {
            self.flag("--permission-prompt-tool", tool.as_str());
        }
    }

    fn add_session_args(&mut self, options: &InvocationOptions) {
        match self.invocation.directive().clone() {
            SessionDirective::New => {}
            SessionDirective::ContinueLast => self.push("--continue"),
            SessionDirective::Resume(session_id) => self.flag("--resume", session_id.to_string()),
        }

        if options.fork_session {
            self.push("--fork-session");
        }

        if options.include_partial_messages {
            self.push("--include-partial-messages");
        }

        if options.resume_session_at.is_some() {
            self.warnings.push(CapabilityWarning::dropped(
                "resumeSessionAt",
                "the CLI has no flag for resuming at a message",
            ));
        }
    }

    fn add_mcp_args(&mut self, options: &InvocationOptions) {
        match &options.mcp_servers {
            McpServers::Servers(servers) if !servers.is_empty() => {
                let document = McpServers::to_config_document(servers);
                self.flag("--mcp-config", document.to_string());
            }
            McpServers::ConfigFile(path) => {
                self.flag("--mcp-config", path.to_string_lossy());
            }
            McpServers::Servers(_) | McpServers::None => {}
        }
    }
}
