//! CLI argument parsing using clap.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::config::Settings;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Re-runs tests for directories whose sources change
#[derive(Parser, Debug)]
#[command(
    name = "testrunner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Re-run the test command for each directory whose source files change",
    next_line_help = true,
    styles = clap_cargo_style(),
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the default `watch` command
    #[command(flatten)]
    pub watch: WatchArgs,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the tree and run tests on change (default)
    Watch(WatchArgs),

    /// Display the effective settings
    Config,
}

/// Overrides for the watch pipeline.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct WatchArgs {
    /// Root directory to watch
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Tracked source file extension
    #[arg(short, long, value_name = "EXT")]
    pub ext: Option<String>,

    /// Milliseconds between rescans for new directories
    #[arg(long, value_name = "MS")]
    pub poll_interval: Option<u64>,

    /// Milliseconds to wait after the last change before running tests
    #[arg(short, long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Test command; the changed directory is appended
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl WatchArgs {
    /// Apply CLI overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.root_dir = root.clone();
        }
        if let Some(ext) = &self.ext {
            settings.extension = ext.clone();
        }
        if let Some(ms) = self.poll_interval {
            settings.poll_interval_ms = ms;
        }
        if let Some(ms) = self.debounce {
            settings.debounce_ms = ms;
        }
        if !self.command.is_empty() {
            settings.command = self.command.clone();
        }
    }
}
