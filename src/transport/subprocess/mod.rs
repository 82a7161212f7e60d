//! Subprocess execution for a single invocation
//!
//! A [`ProcessRunner`] starts one process per [`LaunchSpec`] and hands back a
//! [`ProcessHandle`] that owns it. The handle reads stdout line by line (or
//! all at once), keeps a bounded stderr tail, and guarantees the process is
//! reaped or killed on every path: natural exit, timeout, cancellation,
//! or drop.

mod command;
mod config;
mod lifecycle;
mod process;
mod reader;

pub use command::display_command_line;
pub use config::{
    LaunchSpec, MAX_LINE_LENGTH, NESTED_SESSION_VAR, STDERR_TAIL_BYTES, TERMINATION_GRACE,
};
pub use process::{ProcessHandle, ProcessRunner};
