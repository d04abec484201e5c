//! Common test utilities for thingsorg integration tests.
//!
//! Provides `TestEnv`, which points the binary at captured script output
//! instead of osascript and at a private config directory, so tests never
//! touch Things or the user's `~/.config/thingsorg/`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
pub use tempfile::TempDir;

/// Replayed output for a small library: two tags, one area, one project,
/// a to-do in the project and one in the inbox.
pub const SAMPLE_TAGS: &str = "t1|||Work~~~t2|||Home Office|||t1~~~";
pub const SAMPLE_AREAS: &str = "a1|||Personal|||Some notes|||t1,t2~~~";
pub const SAMPLE_PROJECTS: &str =
    "p1|||Move house|||* pack books|||a1|||open|||2025-02-01 00:00:00 +0000||||||~~~";
pub const SAMPLE_TO_DOS: &str = "td1|||Book van||||||||||||||||||||||||open|||true|||p1~~~\
td2|||Call mom||||||||||||||||||||||||completed|||false~~~";

/// A test environment with isolated replay and config directories.
pub struct TestEnv {
    pub replay_dir: TempDir,
    pub config_dir: TempDir,
    pub work_dir: TempDir,
}

impl TestEnv {
    /// Create an environment with no replay files.
    pub fn new() -> Self {
        Self {
            replay_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
            work_dir: TempDir::new().unwrap(),
        }
    }

    /// Create an environment replaying the sample library.
    pub fn with_sample() -> Self {
        let env = Self::new();
        env.write_replay("tags", SAMPLE_TAGS);
        env.write_replay("areas", SAMPLE_AREAS);
        env.write_replay("projects", SAMPLE_PROJECTS);
        env.write_replay("todos", SAMPLE_TO_DOS);
        env
    }

    /// Get a Command for the thingsorg binary.
    ///
    /// Override variables are set per-command for parallel safety.
    pub fn thingsorg(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_thingsorg"));
        cmd.current_dir(self.work_dir.path());
        cmd.env("THINGSORG_REPLAY_DIR", self.replay_dir.path());
        cmd.env("THINGSORG_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("THINGSORG_OUTPUT");
        cmd.env_remove("THINGSORG_TAG_COLUMN");
        cmd.env_remove("THINGSORG_LOG");
        cmd
    }

    /// Store captured output for the command labelled `label`.
    pub fn write_replay(&self, label: &str, content: &str) {
        std::fs::write(self.replay_dir.path().join(format!("{}.txt", label)), content).unwrap();
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_dir.path().join("config.kdl"), content).unwrap();
    }

    pub fn work_path(&self) -> &Path {
        self.work_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
