//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`THINGSORG_OUTPUT`, `THINGSORG_TAG_COLUMN`)
//! 3. config.kdl
//! 4. Built-in defaults

use super::schema::{validate_single_line, validate_tag_column, OutputFormat, ThingsOrgConfig};
use crate::org::{FormatOptions, DEFAULT_STARTUP, DEFAULT_TAG_COLUMN, DEFAULT_TITLE};
use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable overriding the export destination.
pub const OUTPUT_ENV: &str = "THINGSORG_OUTPUT";

/// Environment variable overriding the tag column.
pub const TAG_COLUMN_ENV: &str = "THINGSORG_TAG_COLUMN";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub title: Resolved<String>,
    pub tag_column: Resolved<usize>,
    pub startup: Resolved<String>,
    /// Export destination; `None` means stdout
    pub output: Option<Resolved<PathBuf>>,
    pub output_format: Resolved<OutputFormat>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            title: Resolved::new(DEFAULT_TITLE.to_string(), ValueSource::Default),
            tag_column: Resolved::new(DEFAULT_TAG_COLUMN, ValueSource::Default),
            startup: Resolved::new(DEFAULT_STARTUP.to_string(), ValueSource::Default),
            output: None,
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref().map(|r| &r.value)
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// Formatter settings derived from this configuration.
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            title: self.title.value.clone(),
            tag_column: self.tag_column.value,
            startup: self.startup.value.clone(),
        }
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub title: Option<String>,
    pub tag_column: Option<usize>,
    pub startup: Option<String>,
    pub output: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tag_column(mut self, column: usize) -> Self {
        self.tag_column = Some(column);
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration with the full precedence chain.
pub fn resolve_config(file: &ThingsOrgConfig, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let mut result = ResolvedConfig::default();

    if let Some(ref title) = overrides.title {
        result.title = Resolved::new(title.clone(), ValueSource::CliFlag);
    } else if let Some(ref title) = file.title {
        result.title = Resolved::new(title.clone(), ValueSource::ConfigFile);
    }
    check_single_line("title", &result.title)?;

    if let Some(column) = overrides.tag_column {
        result.tag_column = Resolved::new(column, ValueSource::CliFlag);
    } else if let Some(column) = env_tag_column()? {
        result.tag_column = Resolved::new(column, ValueSource::EnvVar(TAG_COLUMN_ENV.to_string()));
    } else if let Some(column) = file.tag_column {
        result.tag_column = Resolved::new(column, ValueSource::ConfigFile);
    }
    validate_tag_column(result.tag_column.value).map_err(|e| {
        Error::Config(format!("{} (from {})", e, result.tag_column.source))
    })?;

    if let Some(ref startup) = overrides.startup {
        result.startup = Resolved::new(startup.clone(), ValueSource::CliFlag);
    } else if let Some(ref startup) = file.startup {
        result.startup = Resolved::new(startup.clone(), ValueSource::ConfigFile);
    }
    check_single_line("startup", &result.startup)?;

    if let Some(ref output) = overrides.output {
        result.output = Some(Resolved::new(output.clone(), ValueSource::CliFlag));
    } else if let Some(output) = non_empty_env(OUTPUT_ENV) {
        result.output = Some(Resolved::new(
            PathBuf::from(output),
            ValueSource::EnvVar(OUTPUT_ENV.to_string()),
        ));
    } else if let Some(ref output) = file.output {
        result.output = Some(Resolved::new(output.clone(), ValueSource::ConfigFile));
    }

    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = file.output_format {
        result.output_format = Resolved::new(format, ValueSource::ConfigFile);
    }

    Ok(result)
}

fn check_single_line(name: &str, resolved: &Resolved<String>) -> Result<()> {
    validate_single_line(name, &resolved.value)
        .map_err(|e| Error::Config(format!("{} (from {})", e, resolved.source)))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_tag_column() -> Result<Option<usize>> {
    match non_empty_env(TAG_COLUMN_ENV) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<usize>().map(Some).map_err(|_| {
            Error::Config(format!(
                "{} must be a positive integer, got {:?}",
                TAG_COLUMN_ENV, raw
            ))
        }),
    }
}
