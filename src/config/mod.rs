//! User configuration for thingsorg.
//!
//! ## config.kdl
//!
//! Located at `$THINGSORG_CONFIG_DIR/config.kdl` when that variable is set,
//! otherwise at `~/.config/thingsorg/config.kdl` (the platform config
//! directory). A missing file means "all defaults".
//!
//! Contains:
//! - `title` - `#+TITLE:` of the generated document
//! - `tag-column` - column where heading tags start (1-200)
//! - `startup` - `#+STARTUP:` directive
//! - `output` - default export destination
//! - `output-format` - "json" or "human"
//!
//! ## Precedence
//!
//! CLI flag > environment > config.kdl > defaults. See [`resolver`].

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, OUTPUT_ENV, Resolved, ResolvedConfig, TAG_COLUMN_ENV, ValueSource,
    resolve_config,
};
pub use schema::{OutputFormat, ThingsOrgConfig};

use crate::{Error, Result};
use kdl::KdlDocument;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "THINGSORG_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "config.kdl";

/// Directory holding config.kdl, if one can be determined.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("thingsorg")),
    }
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ThingsOrgConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file");
        return Ok(ThingsOrgConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Config(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;

    let config = ThingsOrgConfig::from_kdl(&doc)
        .and_then(|config| config.validate().map(|_| config))
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Load the user's config.kdl from the default location.
pub fn load_user_config() -> Result<ThingsOrgConfig> {
    match config_path() {
        Some(path) => load_config(&path),
        None => Ok(ThingsOrgConfig::default()),
    }
}
