//! Error types for the watch pipeline.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot walk root directory {root}: {reason}")]
    RootWalkFailed { root: PathBuf, reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("File system event error: {details}")]
    EventError { details: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

/// Errors from running the test command for a directory.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("No test command configured")]
    EmptyCommand,

    #[error("Failed to start `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("`{command}` failed for {dir}: {status}")]
    Failed {
        command: String,
        dir: String,
        status: ExitStatus,
    },
}
