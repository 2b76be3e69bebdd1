//! Turns file writes into directory-changed signals.

use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use walkdir::WalkDir;

use super::config::WatchConfig;
use super::error::WatchError;
use super::lifecycle::{StopHandle, StopReceiver, stop_channel};
use super::source::{DirKey, SourceFilter};
use super::watch_set::WatchSet;

/// Outcome of one walk over the tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Qualifying directories registered during the walk.
    pub watched: usize,
    /// Directories watched for the first time.
    pub added: Vec<PathBuf>,
    /// Entries that could not be read or watched.
    pub errors: usize,
}

/// Keeps the notify handle and the set of directories registered with it.
struct Registrar {
    handle: RecommendedWatcher,
    watch_set: WatchSet,
    root: PathBuf,
    filter: SourceFilter,
    /// Working directory a relative root is resolved against.
    base: Option<PathBuf>,
}

impl Registrar {
    /// Walk the root and (re)register every qualifying directory.
    ///
    /// Only a failure to read the root itself is an error; problems further
    /// down are logged and counted. The walk is synchronous and runs on the
    /// loop's task; it only lists directories, so it stays cheap for source
    /// trees.
    fn scan(&mut self) -> Result<ScanReport, WatchError> {
        let mut report = ScanReport::default();
        let mut qualifying = Vec::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(WatchError::RootWalkFailed {
                        root: self.root.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!("[watcher] walk error: {e}");
                    report.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_dir() || !self.filter.dir_qualifies(entry.path()) {
                continue;
            }

            match self.watch_directory(entry.path()) {
                Ok(()) => qualifying.push(entry.into_path()),
                Err(e) => {
                    tracing::warn!("[watcher] {e}");
                    report.errors += 1;
                }
            }
        }

        report.watched = qualifying.len();
        report.added = self.watch_set.rebuild(qualifying);
        Ok(report)
    }

    /// Register one directory. Re-adding a watched directory is a no-op.
    fn watch_directory(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.handle
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Watches a source tree and emits a [`DirKey`] for every write to a
/// tracked file.
///
/// Directories are watched non-recursively and only when they directly
/// contain a tracked file; a periodic rescan picks up directories that
/// qualify later.
pub struct Watcher {
    registrar: Registrar,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    config: WatchConfig,
    stop: StopHandle,
    stop_rx: StopReceiver,
}

impl Watcher {
    /// Create the watcher and register the initial set of directories.
    ///
    /// Fails if the notify handle cannot be created or the root cannot be
    /// walked.
    pub fn new(config: &WatchConfig) -> Result<Self, WatchError> {
        // notify reports absolute paths even for relative watch paths
        let base = if config.root.is_relative() {
            let cwd = std::env::current_dir().map_err(|e| WatchError::InitFailed {
                reason: format!("cannot read working directory: {e}"),
            })?;
            Some(cwd)
        } else {
            None
        };

        let (tx, rx) = mpsc::channel(100);

        let handle = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;

        let mut registrar = Registrar {
            handle,
            watch_set: WatchSet::new(),
            root: config.root.clone(),
            filter: SourceFilter::new(&config.extension),
            base,
        };

        let report = registrar.scan()?;
        crate::log_event!(
            "watcher",
            "monitoring",
            "{} directories under {} (*.{})",
            report.watched,
            config.root.display(),
            registrar.filter.extension()
        );
        if report.watched == 0 {
            tracing::warn!(
                "[watcher] no .{} files under {} yet",
                registrar.filter.extension(),
                config.root.display()
            );
        }

        let (stop, stop_rx) = stop_channel();

        Ok(Self {
            registrar,
            event_rx: rx,
            config: config.clone(),
            stop,
            stop_rx,
        })
    }

    /// Handle for stopping the loop started by [`Watcher::run`].
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.duplicate()
    }

    /// Number of directories currently registered.
    pub fn watched_dirs(&self) -> usize {
        self.registrar.watch_set.len()
    }

    /// Run the event loop, sending directory keys on `out` until stopped.
    ///
    /// Sending waits for the receiver, so a busy consumer slows the watcher
    /// down instead of letting signals pile up. Errors after startup are
    /// logged and never end the loop.
    pub async fn run(self, out: mpsc::Sender<DirKey>) {
        let Self {
            mut registrar,
            mut event_rx,
            config,
            stop,
            mut stop_rx,
        } = self;
        drop(stop);

        let mut rescan = interval_at(
            Instant::now() + config.poll_interval,
            config.poll_interval,
        );
        rescan.set_missed_tick_behavior(MissedTickBehavior::Skip);

        crate::log_event!("watcher", "started");

        loop {
            tokio::select! {
                Some(res) = event_rx.recv() => {
                    match res {
                        Ok(event) => {
                            let base = registrar.base.as_deref();
                            for key in signals_for(&event, &registrar.filter, base) {
                                if out.send(key).await.is_err() {
                                    tracing::warn!("[watcher] {}", WatchError::ChannelClosed);
                                }
                            }
                        }
                        Err(e) => {
                            let err = WatchError::EventError { details: e.to_string() };
                            tracing::error!("[watcher] {err}");
                        }
                    }
                }

                _ = rescan.tick() => {
                    match registrar.scan() {
                        Ok(report) => {
                            for dir in &report.added {
                                crate::log_event!("watcher", "watching", "{}", dir.display());
                            }
                            crate::debug_event!(
                                "watcher",
                                "rescanned",
                                "{} directories, {} errors",
                                report.watched,
                                report.errors
                            );
                        }
                        Err(e) => tracing::error!("[watcher] rescan failed: {e}"),
                    }
                }

                Some(ack) = stop_rx.recv() => {
                    drop(rescan);
                    drop(registrar);
                    let _ = ack.send(());
                    crate::debug_event!("watcher", "stopped");
                    return;
                }
            }
        }
    }
}

/// Directory keys produced by one notify event.
///
/// Only content writes to tracked files count; creation, removal, renames
/// and metadata changes are ignored. Paths under `base` are keyed relative
/// to it.
fn signals_for(event: &Event, filter: &SourceFilter, base: Option<&Path>) -> Vec<DirKey> {
    if !is_write(&event.kind) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| {
            let matched = filter.matches(path);
            if !matched {
                crate::debug_event!("watcher", "unmatched", "{}", path.display());
            }
            matched
        })
        .map(|path| DirKey::for_event_path(path, base))
        .collect()
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_write_to_tracked_file_signals_its_dir() {
        let filter = SourceFilter::new("go");
        let ev = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "/src/app/main.go",
        );

        let keys = signals_for(&ev, &filter, None);
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "/src/app");
    }

    #[test]
    fn test_relative_paths_get_dot_prefix() {
        let filter = SourceFilter::new("go");
        let ev = event(EventKind::Modify(ModifyKind::Any), "pkg/util.GO");

        assert_eq!(signals_for(&ev, &filter, None), vec![DirKey::new("./pkg")]);
    }

    #[test]
    fn test_event_paths_keyed_relative_to_base() {
        let filter = SourceFilter::new("go");
        let base = Path::new("/work");

        let test_cases = vec![
            ("/work/./proj/pkg/a.go", "./proj/pkg"),
            ("/work/proj/pkg/a.go", "./proj/pkg"),
            ("/work/./top.go", "."),
            ("/elsewhere/b.go", "/elsewhere"),
        ];

        for (path, expected) in test_cases {
            let ev = event(EventKind::Modify(ModifyKind::Any), path);
            assert_eq!(
                signals_for(&ev, &filter, Some(base)),
                vec![DirKey::new(expected)],
                "Failed for path: {path}"
            );
        }
    }

    #[test]
    fn test_non_write_events_ignored() {
        let filter = SourceFilter::new("go");
        let kinds = vec![
            EventKind::Create(CreateKind::File),
            EventKind::Remove(RemoveKind::File),
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
            EventKind::Any,
        ];

        for kind in kinds {
            let ev = event(kind, "/src/main.go");
            assert!(signals_for(&ev, &filter, None).is_empty(), "kind: {:?}", ev.kind);
        }
    }

    #[test]
    fn test_untracked_extension_ignored() {
        let filter = SourceFilter::new("go");
        let ev = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Any)),
            "/src/notes.txt",
        );

        assert!(signals_for(&ev, &filter, None).is_empty());
    }

    fn config_for(root: &Path) -> WatchConfig {
        WatchConfig {
            root: root.to_path_buf(),
            extension: "go".to_string(),
            poll_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn test_initial_scan_registers_qualifying_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pkg/api")).unwrap();
        fs::create_dir_all(root.join("docs")).unwrap();
        fs::write(root.join("main.go"), b"package main").unwrap();
        fs::write(root.join("pkg/api/api.go"), b"package api").unwrap();
        fs::write(root.join("docs/guide.md"), b"# guide").unwrap();

        let watcher = Watcher::new(&config_for(root)).unwrap();

        // root and pkg/api; pkg and docs have no direct .go files
        assert_eq!(watcher.watched_dirs(), 2);
        assert!(watcher.registrar.watch_set.contains(root));
        assert!(watcher.registrar.watch_set.contains(&root.join("pkg/api")));
    }

    #[tokio::test]
    async fn test_missing_root_fails_startup() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone");

        let result = Watcher::new(&config_for(&missing));
        assert!(matches!(result, Err(WatchError::RootWalkFailed { .. })));
    }

    #[tokio::test]
    async fn test_stop_returns_after_loop_exit() {
        let temp_dir = TempDir::new().unwrap();
        let watcher = Watcher::new(&config_for(temp_dir.path())).unwrap();
        let stop = watcher.stop_handle();
        let (tx, _rx) = mpsc::channel(1);

        let task = tokio::spawn(watcher.run(tx));
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), stop.stop())
            .await
            .expect("stop should complete");
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .expect("run should have returned")
            .unwrap();
    }

    #[tokio::test]
    async fn test_rescan_of_removed_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("main.go"), b"package main").unwrap();

        let mut watcher = Watcher::new(&config_for(&root)).unwrap();
        assert_eq!(watcher.watched_dirs(), 1);

        fs::remove_dir_all(&root).unwrap();

        let result = watcher.registrar.scan();
        assert!(matches!(result, Err(WatchError::RootWalkFailed { .. })));
    }

    #[tokio::test]
    async fn test_loop_survives_failed_rescans() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tree");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("main.go"), b"package main").unwrap();

        let mut config = config_for(&root);
        config.poll_interval = Duration::from_millis(20);
        let watcher = Watcher::new(&config).unwrap();
        let stop = watcher.stop_handle();
        let (tx, _rx) = mpsc::channel(1);

        let task = tokio::spawn(watcher.run(tx));
        fs::remove_dir_all(&root).unwrap();

        // Several rescans fail to walk the root in this time
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!task.is_finished());

        tokio::time::timeout(Duration::from_secs(2), stop.stop())
            .await
            .expect("stop should complete");
        tokio::time::timeout(Duration::from_millis(200), task)
            .await
            .expect("run should have returned")
            .unwrap();
    }
}
