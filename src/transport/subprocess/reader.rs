//! Output reading for a process handle

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use uuid::Uuid;

use crate::error::{ClaudeError, Result};
use crate::message::decode_line;

use super::config::{MAX_LINE_LENGTH, STDERR_DRAIN_TIMEOUT, STDERR_TAIL_BYTES, STDOUT_DRAIN_TIMEOUT};
use super::process::ProcessHandle;

impl ProcessHandle {
    /// Next stdout line, without its terminator
    ///
    /// Only reads when called, so unread output stays in the pipe. Returns
    /// `Ok(None)` at end of output.
    ///
    /// # Errors
    /// - `ClaudeError::Decode` for a line longer than the line limit; the
    ///   line is discarded and reading may continue
    /// - `ClaudeError::Timeout` / `ClaudeError::Cancelled` after terminating
    ///   the process
    /// - `ClaudeError::Io` if the pipe fails
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        if self.lines.is_none() {
            let Some(stdout) = self.stdout.take() else {
                return Ok(None);
            };
            self.lines = Some(FramedRead::new(
                stdout,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            ));
        }
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        let child = &mut self.child;
        let exit = &mut self.exit;
        let drain_until = &mut self.drain_until;
        let invocation_id = self.invocation_id;
        let read = async move {
            if exit.is_none() {
                tokio::select! {
                    biased;
                    line = lines.next() => return Ok(line),
                    status = child.wait() => match status {
                        Ok(status) => *exit = Some(status),
                        Err(e) => return Err(e),
                    },
                }
            }
            // The leader is gone; whoever still holds the pipe gets a bounded drain
            let until = *drain_until.get_or_insert_with(|| Instant::now() + STDOUT_DRAIN_TIMEOUT);
            Ok(tokio::time::timeout_at(until, lines.next())
                .await
                .unwrap_or_else(|_| {
                    log::debug!("[{invocation_id}] stdout still open after exit; ending output");
                    None
                }))
        };

        match self.watch.guard(read).await {
            Ok(Ok(Some(Ok(line)))) => {
                if self.debug {
                    log::debug!("[{}] stdout: {line}", self.invocation_id);
                }
                Ok(Some(line))
            }
            Ok(Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded)))) => Err(ClaudeError::decode(
                format!("stdout line exceeds {MAX_LINE_LENGTH} bytes"),
                None,
            )),
            Ok(Ok(Some(Err(LinesCodecError::Io(e))))) | Ok(Err(e)) => {
                self.terminate().await;
                Err(ClaudeError::Io(e))
            }
            Ok(Ok(None)) => Ok(None),
            Err(interrupt) => Err(self.interrupted(interrupt).await),
        }
    }

    /// Read all of stdout, wait for exit and classify it
    ///
    /// Reading stops at end of output, or shortly after the process leader
    /// exits if a descendant still holds stdout open.
    ///
    /// # Errors
    /// Everything [`ProcessHandle::finish`] returns, plus `Timeout`,
    /// `Cancelled` or `Io` while reading
    pub async fn collect_output(mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        if let Some(mut stdout) = self.stdout.take() {
            let child = &mut self.child;
            let exit = &mut self.exit;
            let invocation_id = self.invocation_id;
            let mut read_all = pin!(stdout.read_to_end(&mut output));
            let read = async move {
                tokio::select! {
                    biased;
                    done = &mut read_all => return done.map(drop),
                    status = child.wait() => match status {
                        Ok(status) => *exit = Some(status),
                        Err(e) => return Err(e),
                    },
                }
                match tokio::time::timeout(STDOUT_DRAIN_TIMEOUT, read_all).await {
                    Ok(done) => done.map(drop),
                    Err(_) => {
                        log::debug!("[{invocation_id}] stdout still open after exit; ending output");
                        Ok(())
                    }
                }
            };

            match self.watch.guard(read).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.terminate().await;
                    return Err(ClaudeError::Io(e));
                }
                Err(interrupt) => return Err(self.interrupted(interrupt).await),
            }
        }

        if self.debug {
            log::debug!(
                "[{}] collected {} bytes of stdout",
                self.invocation_id,
                output.len()
            );
        }

        self.finish(last_error(&output)).await?;
        Ok(output)
    }
}

/// Error message of the last structured error record in collected output
fn last_error(output: &[u8]) -> Option<String> {
    output
        .split(|b| *b == b'\n')
        .filter(|line| line.trim_ascii_start().starts_with(b"{"))
        .filter_map(|line| decode_line(line).ok())
        .filter_map(|message| message.error_message())
        .last()
}

/// Bounded tail of a process's stderr, filled by a background task
#[derive(Debug)]
pub(super) struct StderrTail {
    buffer: Arc<Mutex<String>>,
    task: Option<JoinHandle<()>>,
}

impl StderrTail {
    pub(super) fn drain(stderr: ChildStderr, invocation_id: Uuid, debug: bool) -> Self {
        let buffer = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&buffer);

        let task = tokio::spawn(async move {
            let mut lines = FramedRead::new(stderr, LinesCodec::new_with_max_length(STDERR_TAIL_BYTES));
            while let Some(line) = lines.next().await {
                match line {
                    Ok(line) => {
                        if debug {
                            log::debug!("[{invocation_id}] stderr: {line}");
                        }
                        push_tail(&mut sink.lock(), &line);
                    }
                    Err(LinesCodecError::MaxLineLengthExceeded) => {}
                    Err(LinesCodecError::Io(_)) => break,
                }
            }
        });

        Self {
            buffer,
            task: Some(task),
        }
    }

    pub(super) fn empty() -> Self {
        Self {
            buffer: Arc::new(Mutex::new(String::new())),
            task: None,
        }
    }

    pub(super) fn snapshot(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Let the drain task reach end of stream, bounded by the drain timeout
    pub(super) async fn settle(&mut self) {
        if let Some(mut task) = self.task.take()
            && tokio::time::timeout(STDERR_DRAIN_TIMEOUT, &mut task).await.is_err()
        {
            task.abort();
        }
    }

    pub(super) fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn push_tail(tail: &mut String, line: &str) {
    tail.push_str(line);
    tail.push('\n');
    if tail.len() > STDERR_TAIL_BYTES {
        let mut cut = tail.len() - STDERR_TAIL_BYTES;
        while !tail.is_char_boundary(cut) {
            cut += 1;
        }
        tail.drain(..cut);
    }
}
