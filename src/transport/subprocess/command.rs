//! Command construction for a launch spec

use std::process::Stdio;

use tokio::process::Command;

use crate::VERSION;

use super::config::LaunchSpec;

/// Builds the `tokio::process::Command` for a [`LaunchSpec`]
pub(super) struct CommandBuilder<'a> {
    spec: &'a LaunchSpec,
}

impl<'a> CommandBuilder<'a> {
    pub(super) const fn new(spec: &'a LaunchSpec) -> Self {
        Self { spec }
    }

    pub(super) fn build(&self) -> Command {
        let spec = self.spec;
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        for key in &spec.env_remove {
            cmd.env_remove(key);
        }
        cmd.env("CLAUDE_CODE_ENTRYPOINT", "sdk-rust");
        cmd.env("CLAUDE_CODE_CLIENT_VERSION", VERSION);
        cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if let Some(ref cwd) = spec.cwd {
            cmd.env("PWD", cwd);
            cmd.current_dir(cwd);
        }

        // stderr is piped, never inherited, so the child cannot touch the
        // parent's terminal state
        let stdin = if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        cmd.stdin(stdin).stdout(Stdio::piped()).stderr(Stdio::piped());

        // Own process group so termination reaches every descendant
        #[cfg(unix)]
        cmd.process_group(0);
        cmd.kill_on_drop(true);

        cmd
    }
}

/// Render a command line for display, quoting arguments the shell would split
pub fn display_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@+%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
