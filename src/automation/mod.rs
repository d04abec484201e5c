//! Access to the Things 3 automation interface.
//!
//! An [`AutomationCommand`] is an opaque AppleScript payload. A
//! [`ScriptRunner`] turns one into raw text or an execution failure, and the
//! [`executor::CommandExecutor`] makes sure only one runs at a time.

pub mod commands;
pub mod executor;

pub use commands::RecordKind;
pub use executor::CommandExecutor;

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A script to run against the host application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutomationCommand {
    /// Short name used in logs, errors and replay file names
    pub label: String,
    /// AppleScript source
    pub script: String,
}

impl AutomationCommand {
    pub fn new(label: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            script: script.into(),
        }
    }
}

/// Executes automation commands.
///
/// Implementations block; the executor calls them off the async threads.
pub trait ScriptRunner: Send + Sync {
    fn run(&self, command: &AutomationCommand) -> Result<String>;
}

/// Runs scripts through `osascript`.
///
/// Syntax errors, Things not running, and a denied automation permission
/// all surface as a non-zero exit with a message on stderr.
#[derive(Debug, Clone)]
pub struct OsaScriptRunner {
    program: PathBuf,
    script_flag: String,
}

impl Default for OsaScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl OsaScriptRunner {
    pub fn new() -> Self {
        Self::with_program("osascript", "-e")
    }

    /// Use a different interpreter, invoked as `<program> <script_flag> <script>`.
    pub fn with_program(program: impl Into<PathBuf>, script_flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script_flag: script_flag.into(),
        }
    }
}

impl ScriptRunner for OsaScriptRunner {
    fn run(&self, command: &AutomationCommand) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(&self.script_flag)
            .arg(&command.script)
            .output()
            .map_err(|e| {
                Error::execution(
                    &command.label,
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let payload = if stderr.is_empty() {
                format!("{} exited with {}", self.program.display(), output.status)
            } else {
                stderr
            };
            return Err(Error::execution(&command.label, payload));
        }

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        // osascript terminates its result with a newline
        if stdout.ends_with('\n') {
            stdout.pop();
        }
        Ok(stdout)
    }
}

/// Serves previously captured script output from `<dir>/<label>.txt`.
#[derive(Debug, Clone)]
pub struct ReplayRunner {
    dir: PathBuf,
}

impl ReplayRunner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, command: &AutomationCommand) -> PathBuf {
        self.dir.join(format!("{}.txt", command.label))
    }
}

impl ScriptRunner for ReplayRunner {
    fn run(&self, command: &AutomationCommand) -> Result<String> {
        let path = self.path_for(command);
        std::fs::read_to_string(&path).map_err(|e| {
            Error::execution(
                &command.label,
                format!("cannot read replay file {}: {}", path.display(), e),
            )
        })
    }
}
