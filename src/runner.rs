//! Test command execution for a changed directory.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::watcher::{DirKey, RunError};

/// Runs the tests for one directory.
///
/// Implementations report failure through the returned error; whatever the
/// command prints is theirs to surface.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run the tests scoped to `dir` and wait for them to finish.
    async fn invoke(&self, dir: &DirKey) -> Result<(), RunError>;
}

/// Runs an external command with the directory key as its last argument.
///
/// With the default settings this is `go test -race <dir>`.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
}

impl CommandRunner {
    /// Create a runner from a command line such as `["go", "test", "-race"]`.
    pub fn new(command: &[String], workdir: impl Into<PathBuf>) -> Result<Self, RunError> {
        let (program, args) = command.split_first().ok_or(RunError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            workdir: workdir.into(),
        })
    }

    /// The command line that will run for `dir`, for display.
    pub fn command_line(&self, dir: &DirKey) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.program.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(dir.as_str());
        parts.join(" ")
    }
}

#[async_trait]
impl Runner for CommandRunner {
    async fn invoke(&self, dir: &DirKey) -> Result<(), RunError> {
        let command_line = self.command_line(dir);
        crate::log_event!("runner", "running", "{command_line}");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(dir.as_str())
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| RunError::Spawn {
                command: command_line.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(RunError::Failed {
                command: command_line,
                dir: dir.to_string(),
                status,
            });
        }

        crate::debug_event!("runner", "passed", "{dir}");
        Ok(())
    }
}
