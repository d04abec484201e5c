//! Command implementations for the thingsorg CLI.
//!
//! - `export` - fetch, render and write (or print) the Org document
//! - `check` - fetch and report dangling references
//! - `config show` - effective configuration with value sources

use crate::Result;
use crate::automation::{CommandExecutor, OsaScriptRunner, ReplayRunner};
use crate::config::{ResolvedConfig, ValueSource};
use crate::export::Exporter;
use crate::fetcher::DataFetcher;
use crate::models::{IntegrityWarning, Statistics};
use crate::org::OrgFormatter;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    fn to_json(&self) -> String;

    fn to_human(&self) -> String;
}

/// Start an executor backed by osascript, or by captured output when
/// `replay_dir` is given. Must be called inside a tokio runtime.
pub fn executor_for(replay_dir: Option<&Path>) -> CommandExecutor {
    match replay_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "replaying captured script output");
            CommandExecutor::with_runner(ReplayRunner::new(dir))
        }
        None => CommandExecutor::with_runner(OsaScriptRunner::new()),
    }
}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    /// Where the document was written; `None` when it goes to stdout
    pub path: Option<PathBuf>,
    pub statistics: Statistics,
    #[serde(skip)]
    pub content: String,
}

/// The summary of an export. When the document goes to stdout the caller
/// prints `content` itself; these renderings never include it.
impl Output for ExportOutput {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let destination = match self.path {
            Some(ref path) => path.display().to_string(),
            None => "stdout".to_string(),
        };
        format!(
            "Exported {} areas, {} projects, {} to-dos and {} tags to {}",
            self.statistics.areas,
            self.statistics.projects,
            self.statistics.to_dos,
            self.statistics.tags,
            destination
        )
    }
}

/// Run a full export.
///
/// The destination is the resolved output path unless `force_stdout` is set.
pub async fn export(
    replay_dir: Option<&Path>,
    config: &ResolvedConfig,
    force_stdout: bool,
) -> Result<ExportOutput> {
    let fetcher = DataFetcher::new(executor_for(replay_dir));
    let exporter = Exporter::new(fetcher, OrgFormatter::new(config.format_options()));

    let destination = if force_stdout {
        None
    } else {
        config.output().cloned()
    };

    let result = match destination {
        Some(ref path) => exporter.export_to_file(path).await?,
        None => exporter.export().await?,
    };

    Ok(ExportOutput {
        path: destination,
        statistics: result.statistics,
        content: result.content,
    })
}

#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub statistics: Statistics,
    pub warnings: Vec<IntegrityWarning>,
}

impl Output for CheckOutput {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!(
            "{} areas, {} projects, {} to-dos, {} tags",
            self.statistics.areas,
            self.statistics.projects,
            self.statistics.to_dos,
            self.statistics.tags
        )];
        if self.warnings.is_empty() {
            lines.push("No dangling references.".to_string());
        } else {
            lines.push(format!("{} dangling references:", self.warnings.len()));
            lines.extend(self.warnings.iter().map(|w| format!("  - {}", w)));
        }
        lines.join("\n")
    }
}

/// Fetch everything and list references that do not resolve.
pub async fn check(replay_dir: Option<&Path>) -> Result<CheckOutput> {
    let database = DataFetcher::new(executor_for(replay_dir))
        .fetch_all()
        .await?;
    let warnings = database.integrity_warnings();
    for warning in &warnings {
        tracing::debug!(%warning, "dangling reference");
    }
    Ok(CheckOutput {
        statistics: database.statistics(),
        warnings,
    })
}

#[derive(Debug, Serialize)]
pub struct ConfigValue {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub config_path: Option<PathBuf>,
    pub values: Vec<ConfigValue>,
}

impl Output for ConfigOutput {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn to_human(&self) -> String {
        let mut lines = vec![match self.config_path {
            Some(ref path) => format!("Config file: {}", path.display()),
            None => "Config file: (none)".to_string(),
        }];
        for entry in &self.values {
            let value = entry.value.as_deref().unwrap_or("(unset)");
            match entry.source {
                Some(ref source) => lines.push(format!("{} = {} [{}]", entry.key, value, source)),
                None => lines.push(format!("{} = {}", entry.key, value)),
            }
        }
        lines.join("\n")
    }
}

fn config_value(key: &'static str, value: String, source: &ValueSource) -> ConfigValue {
    ConfigValue {
        key,
        value: Some(value),
        source: Some(source.to_string()),
    }
}

/// Describe the effective configuration.
pub fn config_show(config: &ResolvedConfig, config_path: Option<PathBuf>) -> ConfigOutput {
    let output = match config.output {
        Some(ref resolved) => config_value(
            "output",
            resolved.value.display().to_string(),
            &resolved.source,
        ),
        None => ConfigValue {
            key: "output",
            value: None,
            source: None,
        },
    };

    ConfigOutput {
        config_path,
        values: vec![
            config_value("title", config.title.value.clone(), &config.title.source),
            config_value(
                "tag-column",
                config.tag_column.value.to_string(),
                &config.tag_column.source,
            ),
            config_value("startup", config.startup.value.clone(), &config.startup.source),
            output,
            config_value(
                "output-format",
                config.output_format.value.to_string(),
                &config.output_format.source,
            ),
        ],
    }
}
