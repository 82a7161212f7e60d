//! Transport layer: running the Claude Code CLI or the bridge as a subprocess
//!
//! Backends describe *what* to run as a [`LaunchSpec`]; this module owns
//! *how* it runs: spawning, stdin delivery, output capture, deadlines,
//! cancellation and termination.

pub mod subprocess;

pub use subprocess::{LaunchSpec, ProcessHandle, ProcessRunner, display_command_line};
