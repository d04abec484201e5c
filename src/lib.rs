//! thingsorg - Export Things 3 data to an Org-mode outline.
//!
//! This library provides the core functionality for the `thingsorg` CLI:
//! running the Things automation scripts through a serialized executor,
//! parsing their delimited output, and rendering the result as Org markup.

pub mod automation;
pub mod cli;
pub mod commands;
pub mod config;
pub mod export;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod org;
pub mod parser;

/// Library-level error type for thingsorg operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An automation command failed; `payload` describes what the host reported.
    #[error("Automation command '{command}' failed: {payload}")]
    Execution { command: String, payload: String },

    #[error("Command executor is no longer running")]
    ExecutorClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn execution(command: impl Into<String>, payload: impl Into<String>) -> Self {
        Error::Execution {
            command: command.into(),
            payload: payload.into(),
        }
    }
}

/// Result type alias for thingsorg operations.
pub type Result<T> = std::result::Result<T, Error>;
