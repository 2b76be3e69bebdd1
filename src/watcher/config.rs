//! Configuration for directory watching.

use std::path::PathBuf;
use std::time::Duration;

/// What to watch and how often to rescan for new directories.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Root of the tree to watch.
    pub root: PathBuf,
    /// Tracked source extension, without the leading dot.
    pub extension: String,
    /// How often the tree is rescanned for new qualifying directories.
    pub poll_interval: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "go".to_string(),
            poll_interval: Duration::from_secs(10),
        }
    }
}
