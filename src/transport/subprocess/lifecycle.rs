//! Lifecycle management for a process handle (spawn, wait, terminate)

use std::io::ErrorKind;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;

use crate::error::{ClaudeError, Result};

use super::command::CommandBuilder;
use super::config::{LaunchSpec, STDERR_DRAIN_TIMEOUT, TERMINATION_GRACE};
use super::process::{Interrupt, ProcessHandle, Watch};
use super::reader::StderrTail;

/// How hard to ask a process group to stop
#[derive(Debug, Clone, Copy)]
enum Termination {
    Graceful,
    Forced,
}

impl ProcessHandle {
    /// Spawn the process and start delivering stdin
    ///
    /// # Errors
    /// Returns error if the token has already fired or the process cannot be
    /// started
    pub(super) async fn spawn(spec: LaunchSpec, spawned: &AtomicUsize) -> Result<Self> {
        if spec.cancel.is_cancelled() {
            return Err(ClaudeError::Cancelled);
        }

        let program = spec.program.display().to_string();
        let mut child = CommandBuilder::new(&spec).build().spawn().map_err(|e| {
            if let Some(ref cwd) = spec.cwd
                && !cwd.is_dir()
            {
                return ClaudeError::process_launch(format!(
                    "working directory does not exist: {}",
                    cwd.display()
                ));
            }
            ClaudeError::process_launch(format!("{program}: {e}"))
        })?;
        spawned.fetch_add(1, Ordering::SeqCst);

        let pid = child.id();
        log::debug!(
            "[{}] spawned {program} (pid {})",
            spec.invocation_id,
            pid.map_or_else(|| "?".to_string(), |p| p.to_string())
        );

        let watch = Watch::new(spec.timeout, spec.cancel.clone());
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take().map_or_else(StderrTail::empty, |pipe| {
            StderrTail::drain(pipe, spec.invocation_id, spec.debug)
        });
        let stdin_writer = match (spec.stdin, stdin) {
            (Some(content), Some(pipe)) => Some(write_stdin(pipe, content, watch.clone())),
            _ => None,
        };

        let mut handle = Self {
            child,
            pid,
            program,
            stdout,
            lines: None,
            stderr,
            stdin_writer,
            drain_until: None,
            watch,
            exit: None,
            invocation_id: spec.invocation_id,
            debug: spec.debug,
            _release: spec.cancel.clone().drop_guard(),
        };

        if handle.stdout.is_none() {
            handle.terminate().await;
            return Err(ClaudeError::process_launch("Failed to get stdout handle"));
        }

        Ok(handle)
    }

    /// Collect the stdin writer's outcome once the process has exited
    ///
    /// A closed pipe is not an error: the process exited or closed stdin
    /// without reading it all, and its exit status tells the rest.
    pub(super) async fn settle_stdin(&mut self) -> Result<()> {
        let Some(mut writer) = self.stdin_writer.take() else {
            return Ok(());
        };
        match tokio::time::timeout(STDERR_DRAIN_TIMEOUT, &mut writer).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) if e.kind() == ErrorKind::BrokenPipe => {
                log::debug!("[{}] stdin closed early by {}", self.invocation_id, self.program);
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(ClaudeError::Io(e)),
            Ok(Err(e)) => {
                log::warn!("[{}] stdin writer failed: {e}", self.invocation_id);
                Ok(())
            }
            Err(_) => {
                log::warn!("[{}] stdin still open after exit; abandoning it", self.invocation_id);
                writer.abort();
                Ok(())
            }
        }
    }

    /// Wait for the process to exit, honoring the deadline and the token
    ///
    /// # Errors
    /// Returns `Timeout` or `Cancelled` after terminating the process, or
    /// `Io` if waiting itself fails
    pub(super) async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit {
            return Ok(status);
        }

        match self.watch.guard(self.child.wait()).await {
            Ok(Ok(status)) => {
                self.exit = Some(status);
                Ok(status)
            }
            Ok(Err(e)) => {
                self.terminate().await;
                Err(ClaudeError::Io(e))
            }
            Err(interrupt) => Err(self.interrupted(interrupt).await),
        }
    }

    /// Terminate after an interruption and return the matching error
    pub(super) async fn interrupted(&mut self, interrupt: Interrupt) -> ClaudeError {
        let err = self.watch.error(interrupt);
        log::warn!(
            "[{}] {err}; terminating {} (pid {:?})",
            self.invocation_id,
            self.program,
            self.pid
        );
        self.terminate().await;
        err
    }

    /// SIGTERM the process group, SIGKILL it after the grace window
    ///
    /// Returns once the process has been reaped.
    pub(super) async fn terminate(&mut self) {
        if self.exit.is_some() {
            self.reap_group();
            self.abort_stdin();
            return;
        }

        self.signal_group(Termination::Graceful);
        match tokio::time::timeout(TERMINATION_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => self.exit = Some(status),
            Ok(Err(e)) => {
                log::warn!("[{}] wait after SIGTERM failed: {e}", self.invocation_id);
                self.force_kill().await;
            }
            Err(_) => {
                log::warn!(
                    "[{}] {} still running {TERMINATION_GRACE:?} after SIGTERM; killing",
                    self.invocation_id,
                    self.program
                );
                self.force_kill().await;
            }
        }

        // Descendants that ignored SIGTERM outlive the leader
        self.signal_group(Termination::Forced);
        self.abort_stdin();
    }

    /// SIGKILL whatever is left of the group once the leader has been reaped
    pub(super) fn reap_group(&mut self) {
        if self.exit.is_some() {
            self.signal_group(Termination::Forced);
        }
    }

    fn abort_stdin(&mut self) {
        if let Some(writer) = self.stdin_writer.take() {
            writer.abort();
        }
    }

    async fn force_kill(&mut self) {
        self.signal_group(Termination::Forced);
        let _ = self.child.start_kill();
        match self.child.wait().await {
            Ok(status) => self.exit = Some(status),
            Err(e) => log::warn!("[{}] failed to reap killed process: {e}", self.invocation_id),
        }
    }

    #[cfg(unix)]
    fn signal_group(&mut self, termination: Termination) {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let Some(raw) = self.pid.and_then(|pid| i32::try_from(pid).ok()) else {
            return;
        };
        let signal = match termination {
            Termination::Graceful => Signal::SIGTERM,
            Termination::Forced => Signal::SIGKILL,
        };
        match killpg(Pid::from_raw(raw), signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => log::debug!("[{}] killpg({raw}, {signal}) failed: {e}", self.invocation_id),
        }
    }

    #[cfg(not(unix))]
    fn signal_group(&mut self, _termination: Termination) {
        let _ = self.child.start_kill();
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if self.exit.is_none() {
            log::debug!(
                "[{}] handle dropped while {} may still run; killing process group",
                self.invocation_id,
                self.program
            );
            self.signal_group(Termination::Forced);
            let _ = self.child.start_kill();
        } else {
            self.reap_group();
        }
        self.abort_stdin();
        self.stderr.abort();
    }
}

/// Write the whole payload on a background task, then close stdin
///
/// Output is read while this runs, so a process that echoes its input as it
/// goes never stalls on a full stdout pipe.
fn write_stdin(mut pipe: ChildStdin, content: String, watch: Watch) -> JoinHandle<std::io::Result<()>> {
    tokio::spawn(async move {
        let write = async move {
            pipe.write_all(content.as_bytes()).await?;
            pipe.shutdown().await
        };
        // The reading side reports the interruption and terminates the process
        watch.guard(write).await.unwrap_or(Ok(()))
    })
}
