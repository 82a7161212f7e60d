//! Process runner and the handle for one running process

use std::future::Future;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::error::{ClaudeError, Result};
use crate::message::decode_line;

use super::config::LaunchSpec;
use super::reader::StderrTail;

/// Launches processes and counts how many it has started
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    spawned: Arc<AtomicUsize>,
}

impl ProcessRunner {
    /// Create a runner with a zeroed spawn counter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of processes successfully started by this runner
    #[must_use]
    pub fn processes_spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Start one process
    ///
    /// When `spec.stdin` is set its content is written by a background task
    /// that runs alongside output reading, and stdin is closed afterwards.
    ///
    /// # Errors
    /// - `ClaudeError::ProcessLaunch` if the OS refuses to start the process
    /// - `ClaudeError::Cancelled` if the token fired before spawning
    pub async fn run(&self, spec: LaunchSpec) -> Result<ProcessHandle> {
        let handle = ProcessHandle::spawn(spec, &self.spawned).await?;
        Ok(handle)
    }
}

/// Why a guarded wait stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Deadline and cancellation shared by every suspension point of one process
#[derive(Debug, Clone)]
pub(super) struct Watch {
    started: Instant,
    deadline: Option<Instant>,
    pub(super) cancel: CancellationToken,
}

impl Watch {
    pub(super) fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        let started = Instant::now();
        Self {
            started,
            deadline: timeout.map(|t| started + t),
            cancel,
        }
    }

    /// Run `fut` unless the token fires or the deadline passes first
    pub(super) async fn guard<F: Future>(&self, fut: F) -> std::result::Result<F::Output, Interrupt> {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            () = deadline => Err(Interrupt::TimedOut),
            output = fut => Ok(output),
        }
    }

    pub(super) fn error(&self, interrupt: Interrupt) -> ClaudeError {
        match interrupt {
            Interrupt::Cancelled => ClaudeError::Cancelled,
            Interrupt::TimedOut => ClaudeError::Timeout(self.started.elapsed()),
        }
    }
}

/// One running process
///
/// Dropping the handle kills whatever is left of its process group, whether
/// or not the leader has already been reaped.
pub struct ProcessHandle {
    pub(super) child: Child,
    pub(super) pid: Option<u32>,
    pub(super) program: String,
    pub(super) stdout: Option<ChildStdout>,
    pub(super) lines: Option<FramedRead<ChildStdout, LinesCodec>>,
    pub(super) stderr: StderrTail,
    pub(super) stdin_writer: Option<JoinHandle<std::io::Result<()>>>,
    pub(super) drain_until: Option<Instant>,
    pub(super) watch: Watch,
    pub(super) exit: Option<ExitStatus>,
    pub(super) invocation_id: Uuid,
    pub(super) debug: bool,
    pub(super) _release: DropGuard,
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("program", &self.program)
            .field("invocation_id", &self.invocation_id)
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}

impl ProcessHandle {
    /// OS process id, `None` once the process has been reaped by tokio
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Correlation id of the invocation this process serves
    #[must_use]
    pub const fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// Token that terminates this process when cancelled
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.watch.cancel.clone()
    }

    /// Current stderr tail
    #[must_use]
    pub fn stderr_tail(&self) -> String {
        self.stderr.snapshot()
    }

    /// Wait for exit and classify it
    ///
    /// `stdout_error` is the message of a structured error the caller saw on
    /// stdout, if any; otherwise the stderr tail is searched for one.
    ///
    /// # Errors
    /// - `ClaudeError::ExecutionFailed` for an unsuccessful exit status
    /// - `ClaudeError::Timeout` / `ClaudeError::Cancelled` if interrupted
    ///   while waiting; the process is terminated first
    pub async fn finish(mut self, stdout_error: Option<String>) -> Result<ExitStatus> {
        let status = self.wait().await?;
        // Descendants left behind by the leader do not outlive the call
        self.reap_group();
        self.stderr.settle().await;
        self.settle_stdin().await?;

        if status.success() {
            log::debug!("[{}] {} exited successfully", self.invocation_id, self.program);
            return Ok(status);
        }

        let stderr = self.stderr.snapshot();
        let message = stdout_error
            .or_else(|| structured_error(&stderr))
            .unwrap_or_else(|| format!("{} exited unsuccessfully", self.program));
        log::debug!(
            "[{}] {} failed with {status}: {message}",
            self.invocation_id,
            self.program
        );
        Err(ClaudeError::execution_failed(status.code(), message, stderr))
    }
}

/// First structured error object written to stderr
fn structured_error(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .filter_map(|line| decode_line(line.as_bytes()).ok())
        .find_map(|message| message.error_message())
}
