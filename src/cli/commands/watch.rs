//! Watch command - runs the watcher and debouncer until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::runner::{CommandRunner, Runner};
use crate::watcher::{Debouncer, Watcher};

/// Why the pipeline shut down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shutdown {
    /// SIGINT or SIGTERM received.
    Signal(&'static str),
    /// The watcher loop ended on its own.
    WatcherExited(Option<String>),
    /// The debouncer loop ended on its own.
    DebouncerExited,
}

impl std::fmt::Display for Shutdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shutdown::Signal(name) => write!(f, "received signal {name}"),
            Shutdown::WatcherExited(Some(err)) => write!(f, "watcher failed: {err}"),
            Shutdown::WatcherExited(None) => write!(f, "watcher exited"),
            Shutdown::DebouncerExited => write!(f, "debouncer exited"),
        }
    }
}

/// Run the watch command with the default command runner.
pub async fn run(settings: Settings) -> Result<Shutdown> {
    settings.validate()?;

    // Keys carry the root prefix, so the command runs from our own cwd
    let workdir = std::env::current_dir().context("Failed to read working directory")?;
    let runner = CommandRunner::new(&settings.command, workdir).context("Invalid test command")?;

    run_with_runner(&settings, Arc::new(runner), wait_for_signal()).await
}

/// Start the pipeline and stop it when `interrupt` resolves or either loop exits.
///
/// The watcher is stopped before the debouncer so it never waits on a send
/// nobody will receive.
pub async fn run_with_runner(
    settings: &Settings,
    runner: Arc<dyn Runner>,
    interrupt: impl Future<Output = Shutdown>,
) -> Result<Shutdown> {
    let debouncer = Debouncer::new(runner, settings.debounce_delay());
    let watcher = Watcher::new(&settings.watch_config()).with_context(|| {
        format!("Failed to start watching {}", settings.root_dir.display())
    })?;

    let signals = debouncer.signals();
    let stop_debouncer = debouncer.stop_handle();
    let stop_watcher = watcher.stop_handle();

    let mut debouncer_task = tokio::spawn(debouncer.run());
    let mut watcher_task = tokio::spawn(watcher.run(signals));

    crate::log_event!(
        "testrunner",
        "ready",
        "running `{}` after {}ms of quiet",
        settings.command.join(" "),
        settings.debounce_ms
    );

    let reason = tokio::select! {
        reason = interrupt => reason,
        res = &mut watcher_task => match res {
            Ok(()) => Shutdown::WatcherExited(None),
            Err(e) => Shutdown::WatcherExited(Some(e.to_string())),
        },
        _ = &mut debouncer_task => Shutdown::DebouncerExited,
    };

    crate::log_event!("testrunner", "shutting down", "{reason}");

    stop_watcher.stop().await;
    stop_debouncer.stop().await;

    if !watcher_task.is_finished() {
        let _ = watcher_task.await;
    }
    if !debouncer_task.is_finished() {
        let _ = debouncer_task.await;
    }

    Ok(reason)
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn wait_for_signal() -> Shutdown {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => Shutdown::Signal("SIGINT"),
                    _ = term.recv() => Shutdown::Signal("SIGTERM"),
                }
            }
            Err(e) => {
                tracing::warn!("[testrunner] cannot listen for SIGTERM: {e}");
                let _ = tokio::signal::ctrl_c().await;
                Shutdown::Signal("SIGINT")
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        Shutdown::Signal("SIGINT")
    }
}
