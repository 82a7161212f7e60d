//! Limits and launch parameters for subprocess execution

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Longest stdout line accepted before the line is discarded (1MB)
pub const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Bytes of stderr kept for failure diagnostics (64KB)
pub const STDERR_TAIL_BYTES: usize = 64 * 1024;

/// Time a process gets to exit after SIGTERM before it is killed
pub const TERMINATION_GRACE: Duration = Duration::from_secs(2);

/// Time allowed for the stderr pipe to drain after the process exits
///
/// A descendant may inherit the pipe and keep it open past the leader's
/// exit; the drain task is abandoned after this.
pub const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Time allowed for the rest of stdout once the process leader has exited
///
/// A backgrounded descendant holding the pipe open does not keep the call
/// waiting longer than this.
pub const STDOUT_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Environment variable set by Claude Code inside its own sessions
///
/// Removed from the child environment so the CLI does not refuse to start
/// when the host application itself runs under Claude Code.
pub const NESTED_SESSION_VAR: &str = "CLAUDECODE";

/// Everything needed to start one process
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Executable path or name
    pub program: PathBuf,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Variables set on top of the inherited environment
    pub env: Vec<(String, String)>,
    /// Variables removed from the inherited environment
    pub env_remove: Vec<String>,
    /// Content written to stdin while output is read, closed afterwards;
    /// stdin is null when `None`
    pub stdin: Option<String>,
    /// Deadline for the whole invocation, measured from spawn
    pub timeout: Option<Duration>,
    /// Cooperative cancellation
    pub cancel: CancellationToken,
    /// Correlation id for log lines
    pub invocation_id: Uuid,
    /// Log every stdout and stderr line at debug level
    pub debug: bool,
}

impl LaunchSpec {
    /// Spec with defaults for everything but the program and its arguments
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            env: Vec::new(),
            env_remove: vec![NESTED_SESSION_VAR.to_string()],
            stdin: None,
            timeout: None,
            cancel: CancellationToken::new(),
            invocation_id: Uuid::new_v4(),
            debug: false,
        }
    }
}
