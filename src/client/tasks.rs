//! Background tasks spawned by the client

use tokio_util::sync::CancellationToken;

/// Cancel `call` when `external` fires
///
/// The task ends as soon as either token is cancelled; the process handle
/// cancels `call` when it is dropped, so no task outlives its call.
pub(super) fn link_cancellation(external: CancellationToken, call: CancellationToken) {
    if external.is_cancelled() {
        call.cancel();
        return;
    }

    tokio::spawn(async move {
        tokio::select! {
            () = external.cancelled() => {
                log::debug!("Caller cancellation token fired");
                call.cancel();
            }
            () = call.cancelled() => {}
        }
    });
}
