//! Stop handshake shared by the watcher and debouncer loops.
//!
//! A stop request carries a oneshot sender. The loop tears down its
//! resources, answers on the oneshot, and exits; the caller waits for that
//! answer, so `stop()` returning means the loop is gone.

use tokio::sync::{mpsc, oneshot};

/// Acknowledgement channel sent along with a stop request.
pub(crate) type StopRequest = oneshot::Sender<()>;

/// Receiving side polled by a component loop.
pub(crate) type StopReceiver = mpsc::Receiver<StopRequest>;

/// Create a stop handle and the receiver its loop listens on.
pub(crate) fn stop_channel() -> (StopHandle, StopReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (StopHandle { tx }, rx)
}

/// Requests synchronous shutdown of a running component.
#[derive(Debug)]
pub struct StopHandle {
    tx: mpsc::Sender<StopRequest>,
}

impl StopHandle {
    /// Another handle for the same component.
    pub(crate) fn duplicate(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }

    /// Ask the loop to stop and wait until it has.
    ///
    /// Returns immediately if the loop already exited.
    pub async fn stop(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ack_tx).await.is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}
