//! Fetch-and-format orchestration.

use crate::fetcher::DataFetcher;
use crate::models::Statistics;
use crate::org::OrgFormatter;
use crate::Result;
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode for a newly created export file.
#[cfg(unix)]
pub const EXPORT_FILE_MODE: u32 = 0o644;

/// Rendered document plus the counts it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportResult {
    pub content: String,
    pub statistics: Statistics,
}

/// Produces an Org document from live (or replayed) Things data.
#[derive(Debug, Clone)]
pub struct Exporter {
    fetcher: DataFetcher,
    formatter: OrgFormatter,
}

impl Exporter {
    pub fn new(fetcher: DataFetcher, formatter: OrgFormatter) -> Self {
        Self { fetcher, formatter }
    }

    /// Fetch everything and render it, dated today.
    pub async fn export(&self) -> Result<ExportResult> {
        self.export_at(Local::now().date_naive()).await
    }

    /// Fetch everything and render it with an explicit header date.
    pub async fn export_at(&self, generated_on: NaiveDate) -> Result<ExportResult> {
        let database = self.fetcher.fetch_all().await?;
        let content = self.formatter.format_at(&database, generated_on);
        let statistics = database.statistics();
        tracing::info!(
            areas = statistics.areas,
            projects = statistics.projects,
            to_dos = statistics.to_dos,
            bytes = content.len(),
            "export rendered"
        );
        Ok(ExportResult {
            content,
            statistics,
        })
    }

    /// Export and write the document to `path`.
    ///
    /// Nothing is written when the fetch fails. The file is replaced
    /// atomically so readers never see a partial document.
    pub async fn export_to_file(&self, path: &Path) -> Result<ExportResult> {
        self.export_to_file_at(path, Local::now().date_naive()).await
    }

    pub async fn export_to_file_at(
        &self,
        path: &Path,
        generated_on: NaiveDate,
    ) -> Result<ExportResult> {
        let result = self.export_at(generated_on).await?;
        write_atomic(path, &result.content)?;
        tracing::info!(path = %path.display(), "export written");
        Ok(result)
    }
}

/// Write through a sibling temp file, then rename over `path`.
///
/// An existing file keeps its permissions; a new one gets
/// [`EXPORT_FILE_MODE`].
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(content.as_bytes())?;
    if let Some(permissions) = target_permissions(path) {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(EXPORT_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}
