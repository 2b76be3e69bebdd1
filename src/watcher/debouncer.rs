//! Coalesces directory-changed signals and serializes test runs.
//!
//! Every signal restarts a single debounce window. When the window expires
//! the oldest pending directory is handed to the [`Runner`]. While directories
//! remain the window re-arms after each run, so they drain one per window
//! without new signals. An empty queue leaves the window disarmed until the
//! next signal.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, Sleep, sleep_until};

use super::lifecycle::{StopHandle, StopReceiver, stop_channel};
use super::pending::PendingQueue;
use super::source::DirKey;
use crate::runner::Runner;

/// Single re-armable timer.
///
/// Arming replaces any previous deadline; an unarmed window never expires.
#[derive(Debug)]
pub(crate) struct DebounceWindow {
    period: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl DebounceWindow {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            timer: None,
        }
    }

    /// Start a fresh window of one period from now.
    pub(crate) fn arm(&mut self) {
        let deadline = Instant::now() + self.period;
        match self.timer.as_mut() {
            Some(timer) => timer.as_mut().reset(deadline),
            None => self.timer = Some(Box::pin(sleep_until(deadline))),
        }
    }

    pub(crate) fn cancel(&mut self) {
        self.timer = None;
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Resolves when the armed window runs out.
    pub(crate) fn expired(&mut self) -> impl Future<Output = ()> + '_ {
        async move {
            match self.timer.as_mut() {
                Some(timer) => timer.as_mut().await,
                None => pending().await,
            }
        }
    }
}

/// Debounces directory keys and runs tests one directory at a time.
pub struct Debouncer {
    runner: Arc<dyn Runner>,
    delay: Duration,
    signal_tx: mpsc::Sender<DirKey>,
    signal_rx: mpsc::Receiver<DirKey>,
    stop: StopHandle,
    stop_rx: StopReceiver,
}

impl Debouncer {
    /// Create a debouncer that waits `delay` after the last signal.
    pub fn new(runner: Arc<dyn Runner>, delay: Duration) -> Self {
        // Capacity 1 is the closest tokio gets to a rendezvous channel
        let (signal_tx, signal_rx) = mpsc::channel(1);
        let (stop, stop_rx) = stop_channel();
        Self {
            runner,
            delay,
            signal_tx,
            signal_rx,
            stop,
            stop_rx,
        }
    }

    /// Sender for directory-changed signals.
    pub fn signals(&self) -> mpsc::Sender<DirKey> {
        self.signal_tx.clone()
    }

    /// Handle for stopping the loop started by [`Debouncer::run`].
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.duplicate()
    }

    /// Run the coalescing loop until stopped.
    ///
    /// Keys still queued when the stop request arrives are discarded.
    pub async fn run(self) {
        let Self {
            runner,
            delay,
            signal_tx,
            mut signal_rx,
            stop,
            mut stop_rx,
        } = self;
        drop(signal_tx);
        drop(stop);

        let mut queue = PendingQueue::new();
        let mut window = DebounceWindow::new(delay);

        crate::debug_event!("debouncer", "started", "delay {delay:?}");

        loop {
            tokio::select! {
                Some(key) = signal_rx.recv() => {
                    if queue.push(key.clone()) {
                        crate::debug_event!("debouncer", "queued", "{key}");
                    }
                    window.arm();
                }

                _ = window.expired(), if window.is_armed() => {
                    let Some(key) = queue.pop() else {
                        window.cancel();
                        continue;
                    };

                    if let Err(e) = runner.invoke(&key).await {
                        tracing::error!("[debouncer] {e}");
                    }
                    // Next drain is at least one delay after this one finished
                    if queue.is_empty() {
                        window.cancel();
                    } else {
                        window.arm();
                    }
                }

                Some(ack) = stop_rx.recv() => {
                    window.cancel();
                    let discarded = queue.clear();
                    if discarded > 0 {
                        crate::debug_event!("debouncer", "discarded", "{discarded} pending");
                    }
                    let _ = ack.send(());
                    crate::debug_event!("debouncer", "stopped");
                    return;
                }

                else => {
                    crate::debug_event!("debouncer", "all senders gone, exiting");
                    return;
                }
            }
        }
    }
}
