//! KDL schema for config.kdl.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted tag column.
pub const MAX_TAG_COLUMN: usize = 200;

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// title "Things 3 Export"
/// tag-column 60
/// startup "overview"
/// output "~/org/things.org"
/// output-format "human"  // or "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingsOrgConfig {
    /// `#+TITLE:` of the generated document
    pub title: Option<String>,

    /// Column where heading tag blocks start
    pub tag_column: Option<usize>,

    /// `#+STARTUP:` directive
    pub startup: Option<String>,

    /// Default destination for `thingsorg export`
    pub output: Option<PathBuf>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl ThingsOrgConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(column) = self.tag_column {
            validate_tag_column(column)?;
        }
        if let Some(ref title) = self.title {
            validate_single_line("title", title)?;
        }
        if let Some(ref startup) = self.startup {
            validate_single_line("startup", startup)?;
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes are ignored. Known nodes with a value of the wrong type
    /// or an unknown output format are rejected.
    pub fn from_kdl(doc: &KdlDocument) -> Result<Self, String> {
        let mut config = Self::new();

        if let Some(value) = first_value(doc, "title") {
            config.title = Some(expect_string("title", value)?.to_string());
        }

        if let Some(value) = first_value(doc, "tag-column") {
            let column = value
                .as_integer()
                .ok_or_else(|| "tag-column must be an integer".to_string())?;
            // Out-of-range integers are kept for validate() to report
            config.tag_column = Some(usize::try_from(column).unwrap_or(0));
        }

        if let Some(value) = first_value(doc, "startup") {
            config.startup = Some(expect_string("startup", value)?.to_string());
        }

        if let Some(value) = first_value(doc, "output") {
            config.output = Some(expand_home(expect_string("output", value)?));
        }

        if let Some(value) = first_value(doc, "output-format") {
            let raw = expect_string("output-format", value)?;
            config.output_format = Some(OutputFormat::parse(raw).ok_or_else(|| {
                format!("output-format must be \"json\" or \"human\", got {:?}", raw)
            })?);
        }

        Ok(config)
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(ref title) = self.title {
            push_node(&mut doc, "title", KdlValue::String(title.clone()));
        }
        if let Some(column) = self.tag_column {
            push_node(&mut doc, "tag-column", KdlValue::Integer(column as i128));
        }
        if let Some(ref startup) = self.startup {
            push_node(&mut doc, "startup", KdlValue::String(startup.clone()));
        }
        if let Some(ref output) = self.output {
            push_node(
                &mut doc,
                "output",
                KdlValue::String(output.display().to_string()),
            );
        }
        if let Some(format) = self.output_format {
            push_node(
                &mut doc,
                "output-format",
                KdlValue::String(format.as_str().to_string()),
            );
        }

        doc
    }
}

pub fn validate_tag_column(column: usize) -> Result<(), String> {
    if column == 0 || column > MAX_TAG_COLUMN {
        return Err(format!(
            "tag-column must be 1-{}, got {}",
            MAX_TAG_COLUMN, column
        ));
    }
    Ok(())
}

/// Header values are written verbatim into `#+KEY:` lines.
pub fn validate_single_line(name: &str, value: &str) -> Result<(), String> {
    if value.contains(['\n', '\r']) {
        return Err(format!("{} must be a single line", name));
    }
    Ok(())
}

fn first_value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    doc.get(name)
        .and_then(|node| node.entries().first())
        .map(|entry| entry.value())
}

fn expect_string<'a>(name: &str, value: &'a KdlValue) -> Result<&'a str, String> {
    value
        .as_string()
        .ok_or_else(|| format!("{} must be a string", name))
}

fn push_node(doc: &mut KdlDocument, name: &str, value: KdlValue) {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(value));
    doc.nodes_mut().push(node);
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kdl: &str) -> Result<ThingsOrgConfig, String> {
        let doc: KdlDocument = kdl.parse().unwrap();
        ThingsOrgConfig::from_kdl(&doc)
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("HUMAN"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_from_kdl_all_fields() {
        let config = parse(
            r#"
title "My Tasks"
tag-column 72
startup "content"
output "/tmp/things.org"
output-format "human"
"#,
        )
        .unwrap();
        assert_eq!(config.title.as_deref(), Some("My Tasks"));
        assert_eq!(config.tag_column, Some(72));
        assert_eq!(config.startup.as_deref(), Some("content"));
        assert_eq!(config.output, Some(PathBuf::from("/tmp/things.org")));
        assert_eq!(config.output_format, Some(OutputFormat::Human));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_kdl_empty_and_unknown_nodes() {
        assert_eq!(parse("").unwrap(), ThingsOrgConfig::default());
        assert_eq!(
            parse("editor \"vim\"\ncolour 3").unwrap(),
            ThingsOrgConfig::default()
        );
    }

    #[test]
    fn test_from_kdl_rejects_bad_types() {
        assert!(parse("tag-column \"wide\"").unwrap_err().contains("integer"));
        assert!(parse("title 3").unwrap_err().contains("string"));
        assert!(parse("output-format \"yaml\"").unwrap_err().contains("yaml"));
    }

    #[test]
    fn test_validate_tag_column_range() {
        for bad in ["tag-column 0", "tag-column 201", "tag-column -4"] {
            let config = parse(bad).unwrap();
            assert!(config.validate().is_err(), "{} should be invalid", bad);
        }
        assert!(parse("tag-column 1").unwrap().validate().is_ok());
        assert!(parse("tag-column 200").unwrap().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_multi_line_header_values() {
        let config = parse("startup \"overview\\n* Injected\"").unwrap();
        assert_eq!(config.startup.as_deref(), Some("overview\n* Injected"));
        assert!(config.validate().unwrap_err().contains("startup"));

        let config = parse("title \"a\\rb\"").unwrap();
        assert!(config.validate().unwrap_err().contains("title"));

        assert!(validate_single_line("title", "Things 3 Export").is_ok());
    }

    #[test]
    fn test_expand_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/org/a.org"), home.join("org/a.org"));
        }
        assert_eq!(expand_home("/abs/a.org"), PathBuf::from("/abs/a.org"));
    }

    #[test]
    fn test_to_kdl_round_trips() {
        let config = ThingsOrgConfig {
            title: Some("Export".to_string()),
            tag_column: Some(50),
            startup: None,
            output: Some(PathBuf::from("/tmp/out.org")),
            output_format: Some(OutputFormat::Json),
        };
        let parsed = ThingsOrgConfig::from_kdl(&config.to_kdl()).unwrap();
        assert_eq!(parsed, config);
    }
}
