//! Watches a source tree and re-runs the test command for each directory
//! whose source files change.

pub mod cli;
pub mod config;
pub mod logging;
pub mod runner;
pub mod watcher;

pub use config::Settings;
pub use runner::{CommandRunner, Runner};
pub use watcher::{Debouncer, DirKey, RunError, StopHandle, WatchConfig, WatchError, Watcher};
