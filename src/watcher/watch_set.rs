//! Set of directories registered with the underlying file watcher.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Directories currently registered for watching.
///
/// Rebuilt from scratch on every scan. Directories that disappear from disk
/// are dropped by the OS watch mechanism itself, so the set only needs to
/// report what a scan newly added.
#[derive(Debug, Default)]
pub(crate) struct WatchSet {
    dirs: HashSet<PathBuf>,
}

impl WatchSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the directories from a scan.
    ///
    /// Returns directories that weren't in the previous set.
    pub fn rebuild(&mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
        let previous = std::mem::take(&mut self.dirs);
        let mut added = Vec::new();

        for dir in dirs {
            if self.dirs.insert(dir.clone()) && !previous.contains(&dir) {
                added.push(dir);
            }
        }

        added
    }

    /// Check if a directory is in the set.
    #[cfg(test)]
    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    /// Get count of watched directories.
    pub fn len(&self) -> usize {
        self.dirs.len()
    }
}
