//! One acquisition pass: run the four extraction commands and assemble a
//! [`Database`].

use crate::automation::{CommandExecutor, RecordKind};
use crate::models::Database;
use crate::parser::RecordParser;
use crate::Result;
use std::time::Instant;

/// Fetches every record kind through a shared [`CommandExecutor`].
#[derive(Debug, Clone)]
pub struct DataFetcher {
    executor: CommandExecutor,
    parser: RecordParser,
}

impl DataFetcher {
    pub fn new(executor: CommandExecutor) -> Self {
        Self::with_parser(executor, RecordParser::new())
    }

    pub fn with_parser(executor: CommandExecutor, parser: RecordParser) -> Self {
        Self { executor, parser }
    }

    /// Fetch tags, areas, projects and to-dos.
    ///
    /// All four commands are enqueued up front; the executor still runs
    /// them one at a time. The first failure is returned and nothing is
    /// parsed unless every command succeeded.
    pub async fn fetch_all(&self) -> Result<Database> {
        let started = Instant::now();
        let [tags, areas, projects, to_dos] =
            RecordKind::ALL.map(|kind| self.executor.submit(kind.command()));

        let (tags, areas, projects, to_dos) = tokio::try_join!(tags, areas, projects, to_dos)?;

        let database = Database::new(
            self.parser.parse_tags(&tags),
            self.parser.parse_areas(&areas),
            self.parser.parse_projects(&projects),
            self.parser.parse_to_dos(&to_dos),
        );

        let stats = database.statistics();
        tracing::info!(
            areas = stats.areas,
            projects = stats.projects,
            to_dos = stats.to_dos,
            tags = stats.tags,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched Things data"
        );
        Ok(database)
    }
}
