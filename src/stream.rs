//! Streaming result channel for `stream-json` output

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::stream::{self, BoxStream, FusedStream};
use tokio_util::sync::CancellationToken;

use crate::error::{ClaudeError, Result};
use crate::message::decode_line;
use crate::transport::ProcessHandle;
use crate::types::messages::Message;

/// Forward-only sequence of decoded messages
///
/// A live stream owns its process and pulls one stdout line per poll, so
/// output the caller has not asked for stays in the pipe. Lines that do not
/// decode are logged and skipped. A timeout, cancellation or unsuccessful
/// exit ends the stream with one `Err` item. Dropping the stream kills a
/// process that is still running.
///
/// Once the stream has ended it keeps returning `None`.
pub struct MessageStream {
    inner: BoxStream<'static, Result<Message>>,
    cancel: Option<CancellationToken>,
    done: bool,
}

impl MessageStream {
    /// Stream messages from a running process as they are produced
    pub(crate) fn live(mut handle: ProcessHandle) -> Self {
        let cancel = handle.cancel_token();
        let invocation_id = handle.invocation_id();

        let inner = async_stream::stream! {
            let mut failure: Option<String> = None;
            loop {
                match handle.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match decode_line(line.as_bytes()) {
                            Ok(message) => {
                                if let Some(error) = message.error_message() {
                                    failure = Some(error);
                                }
                                yield Ok(message);
                            }
                            Err(e) => log::warn!("[{invocation_id}] skipping undecodable line: {e}"),
                        }
                    }
                    Ok(None) => break,
                    Err(ClaudeError::Decode { message, .. }) => {
                        log::warn!("[{invocation_id}] skipping line: {message}");
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            if let Err(e) = handle.finish(failure).await {
                yield Err(e);
            }
        };

        Self {
            inner: Box::pin(inner),
            cancel: Some(cancel),
            done: false,
        }
    }

    /// Already completed stream over collected messages
    #[must_use]
    pub fn completed(messages: Vec<Message>) -> Self {
        Self {
            inner: Box::pin(stream::iter(messages.into_iter().map(Ok))),
            cancel: None,
            done: false,
        }
    }

    /// Whether this stream is backed by a running process
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.cancel.is_some()
    }

    /// Ask the backing process to stop
    ///
    /// The process is terminated at the next poll, which then yields
    /// `ClaudeError::Cancelled`. Has no effect on a completed stream.
    pub fn cancel(&self) {
        if let Some(ref token) = self.cancel {
            token.cancel();
        }
    }

    /// Drain the stream, failing on the first error
    ///
    /// # Errors
    /// Returns the error item that ended the stream
    pub async fn collect_messages(mut self) -> Result<Vec<Message>> {
        use futures::StreamExt;

        let mut messages = Vec::new();
        while let Some(item) = self.next().await {
            messages.push(item?);
        }
        Ok(messages)
    }
}

impl Stream for MessageStream {
    type Item = Result<Message>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl FusedStream for MessageStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

impl fmt::Debug for MessageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("live", &self.is_live())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}
