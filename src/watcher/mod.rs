//! Change-triggered test pipeline.
//!
//! Two single-task loops connected by a small bounded channel:
//!
//! ```text
//! notify events
//!       |
//!    Watcher   - filters writes to tracked files, rescans for new dirs
//!       |  DirKey
//!   Debouncer  - FIFO of distinct keys, one drain per quiet window
//!       |
//!    Runner    - runs the test command for one directory
//! ```
//!
//! Both loops stop through a [`StopHandle`] that resolves only once the
//! loop has released its resources.

mod config;
mod debouncer;
mod dir_watcher;
mod error;
mod lifecycle;
mod pending;
mod source;
mod watch_set;

pub use config::WatchConfig;
pub use debouncer::Debouncer;
pub use dir_watcher::{ScanReport, Watcher};
pub use error::{RunError, WatchError};
pub use lifecycle::StopHandle;
pub use source::{DirKey, SourceFilter};
