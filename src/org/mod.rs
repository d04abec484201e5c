//! Org-mode rendering of a [`Database`].
//!
//! Layout of the generated document:
//!
//! ```text
//! #+TITLE: Things 3 Export
//! #+DATE: <2025-01-20 Mon>
//! #+STARTUP: overview
//! #+TODO: TODO | DONE CANCELLED
//!
//! * Area                                                      :tag:area:
//! ** TODO Project                                             :project:
//!    DEADLINE: <2025-02-01 Sat>
//! *** TODO To-do in project                                   :today:
//! ** TODO To-do directly in area
//! * No Area                                                   :noArea:
//! * Inbox                                                     :inbox:
//! ```
//!
//! Tag blocks start at a fixed column, or one space after the heading text
//! when the heading is already wider than that.

use crate::models::{Area, Database, Project, ToDo};
use chrono::{Local, NaiveDate, NaiveDateTime};

/// Column at which tag blocks start.
pub const DEFAULT_TAG_COLUMN: usize = 60;

pub const DEFAULT_TITLE: &str = "Things 3 Export";

pub const DEFAULT_STARTUP: &str = "overview";

const HEADING_MARKER: char = '*';

/// Presentation settings for the generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Value of the `#+TITLE:` line
    pub title: String,
    /// Column where tag blocks start
    pub tag_column: usize,
    /// Value of the `#+STARTUP:` line
    pub startup: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            tag_column: DEFAULT_TAG_COLUMN,
            startup: DEFAULT_STARTUP.to_string(),
        }
    }
}

/// Renders a database as an Org outline.
///
/// Pure: the same database and generation date always produce the same text.
#[derive(Debug, Clone, Default)]
pub struct OrgFormatter {
    options: FormatOptions,
}

impl OrgFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Render with today's local date in the header.
    pub fn format(&self, database: &Database) -> String {
        self.format_at(database, Local::now().date_naive())
    }

    /// Render with an explicit generation date.
    pub fn format_at(&self, database: &Database, generated_on: NaiveDate) -> String {
        let mut out = String::new();
        self.write_header(&mut out, generated_on);

        for area in &database.areas {
            self.write_area(&mut out, area, database);
        }

        let orphan_projects = database.orphan_projects();
        if !orphan_projects.is_empty() {
            self.write_heading(&mut out, 1, None, "No Area", &["noArea".to_string()]);
            for project in orphan_projects {
                self.write_project(&mut out, project, database, 2);
            }
        }

        let orphan_to_dos = database.orphan_to_dos();
        if !orphan_to_dos.is_empty() {
            self.write_heading(&mut out, 1, None, "Inbox", &["inbox".to_string()]);
            for to_do in orphan_to_dos {
                self.write_to_do(&mut out, to_do, database, 2);
            }
        }

        out
    }

    fn write_header(&self, out: &mut String, generated_on: NaiveDate) {
        out.push_str(&format!("#+TITLE: {}\n", self.options.title));
        out.push_str(&format!("#+DATE: {}\n", org_date(generated_on)));
        out.push_str(&format!("#+STARTUP: {}\n", self.options.startup));
        out.push_str("#+TODO: TODO | DONE CANCELLED\n\n");
    }

    fn write_area(&self, out: &mut String, area: &Area, database: &Database) {
        let tags = resolve_tags(&area.tag_ids, database, &["area"]);
        self.write_heading(out, 1, None, &area.name, &tags);
        write_notes(out, area.notes.as_deref(), &body_indent(1));

        for project in database.projects_for_area(&area.id) {
            self.write_project(out, project, database, 2);
        }
        for to_do in database.to_dos_for_area(&area.id) {
            self.write_to_do(out, to_do, database, 2);
        }
    }

    fn write_project(&self, out: &mut String, project: &Project, database: &Database, level: usize) {
        let tags = resolve_tags(&project.tag_ids, database, &["project"]);
        self.write_heading(
            out,
            level,
            Some(project.status.org_keyword()),
            &project.name,
            &tags,
        );

        let indent = body_indent(level);
        write_timestamp(out, &indent, "DEADLINE", project.due_date);
        write_timestamp(out, &indent, "CLOSED", project.completion_date);
        write_notes(out, project.notes.as_deref(), &indent);

        for to_do in database.to_dos_for_project(&project.id) {
            self.write_to_do(out, to_do, database, level + 1);
        }
    }

    fn write_to_do(&self, out: &mut String, to_do: &ToDo, database: &Database, level: usize) {
        let structural: &[&str] = if to_do.today { &["today"] } else { &[] };
        let tags = resolve_tags(&to_do.tag_ids, database, structural);
        self.write_heading(
            out,
            level,
            Some(to_do.status.org_keyword()),
            &to_do.name,
            &tags,
        );

        let indent = body_indent(level);
        write_timestamp(out, &indent, "SCHEDULED", to_do.activation_date);
        write_timestamp(out, &indent, "DEADLINE", to_do.due_date);
        write_timestamp(out, &indent, "CLOSED", to_do.completion_date);
        write_notes(out, to_do.notes.as_deref(), &indent);
    }

    /// `*** KEYWORD Name<padding>:tag:tag:`
    fn write_heading(
        &self,
        out: &mut String,
        level: usize,
        keyword: Option<&str>,
        name: &str,
        tags: &[String],
    ) {
        let mut line = HEADING_MARKER.to_string().repeat(level);
        line.push(' ');
        if let Some(keyword) = keyword {
            line.push_str(keyword);
            line.push(' ');
        }
        line.push_str(name);

        if let Some(block) = tag_block(tags) {
            let width = line.chars().count();
            let padding = self.options.tag_column.saturating_sub(width).max(1);
            line.push_str(&" ".repeat(padding));
            line.push_str(&block);
        }

        out.push_str(&line);
        out.push('\n');
    }
}

/// Own tag names (unresolvable ids skipped) followed by structural tags.
fn resolve_tags(tag_ids: &[String], database: &Database, structural: &[&str]) -> Vec<String> {
    tag_ids
        .iter()
        .filter_map(|id| database.tag(id).map(|t| t.name.clone()))
        .chain(structural.iter().map(|s| s.to_string()))
        .collect()
}

/// `:a:b:` with spaces and colons inside names replaced by underscores.
fn tag_block(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let sanitized: Vec<String> = tags
        .iter()
        .map(|t| t.replace([' ', ':'], "_"))
        .collect();
    Some(format!(":{}:", sanitized.join(":")))
}

/// Body text sits one column past the heading markers.
fn body_indent(level: usize) -> String {
    " ".repeat(level + 1)
}

/// `<2025-01-20 Mon>`, always with English weekday abbreviations.
pub fn org_date(date: NaiveDate) -> String {
    format!("<{}>", date.format("%Y-%m-%d %a"))
}

fn write_timestamp(out: &mut String, indent: &str, keyword: &str, date: Option<NaiveDateTime>) {
    if let Some(date) = date {
        out.push_str(&format!("{}{}: {}\n", indent, keyword, org_date(date.date())));
    }
}

/// Blank line, indented note lines, blank line.
///
/// Lines starting with `*` get a leading comma so Org does not read them as
/// headings.
fn write_notes(out: &mut String, notes: Option<&str>, indent: &str) {
    let Some(notes) = notes.filter(|n| !n.is_empty()) else {
        return;
    };

    out.push('\n');
    let normalized = notes.replace("\r\n", "\n");
    for line in normalized.split(['\n', '\r']) {
        out.push_str(indent);
        if line.starts_with(HEADING_MARKER) {
            out.push(',');
        }
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemStatus, Tag};
    use crate::parser::RecordParser;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        day(y, m, d).and_hms_opt(0, 0, 0).unwrap()
    }

    fn render(db: &Database) -> String {
        OrgFormatter::default().format_at(db, day(2025, 1, 20))
    }

    fn line_starting<'a>(doc: &'a str, prefix: &str) -> &'a str {
        doc.lines()
            .find(|l| l.starts_with(prefix))
            .unwrap_or_else(|| panic!("no line starting with {:?} in:\n{}", prefix, doc))
    }

    #[test]
    fn test_header() {
        let doc = render(&Database::default());
        assert_eq!(
            doc,
            "#+TITLE: Things 3 Export\n\
             #+DATE: <2025-01-20 Mon>\n\
             #+STARTUP: overview\n\
             #+TODO: TODO | DONE CANCELLED\n\n"
        );
    }

    #[test]
    fn test_custom_options_in_header() {
        let formatter = OrgFormatter::new(FormatOptions {
            title: "Tasks".to_string(),
            tag_column: 40,
            startup: "content".to_string(),
        });
        let doc = formatter.format_at(&Database::default(), day(2024, 2, 29));
        assert!(doc.starts_with("#+TITLE: Tasks\n#+DATE: <2024-02-29 Thu>\n#+STARTUP: content\n"));
    }

    #[test]
    fn test_area_tags_aligned_and_sanitized() {
        let mut area = Area::new("a1", "Work");
        area.tag_ids = vec!["t1".to_string(), "missing".to_string(), "t2".to_string()];
        let db = Database::new(
            vec![Tag::new("t1", "Home Office"), Tag::new("t2", "a:b")],
            vec![area],
            vec![],
            vec![],
        );
        let doc = render(&db);
        let line = line_starting(&doc, "* Work");
        assert!(line.ends_with(":Home_Office:a_b:area:"), "line: {:?}", line);
        assert_eq!(line.find(':'), Some(DEFAULT_TAG_COLUMN));
        assert_eq!(&line[..6], "* Work");
        assert!(line[6..DEFAULT_TAG_COLUMN].chars().all(|c| c == ' '));
    }

    #[test]
    fn test_long_heading_gets_single_space_before_tags() {
        let name = "x".repeat(70);
        let db = Database::new(vec![], vec![Area::new("a1", &name)], vec![], vec![]);
        let doc = render(&db);
        assert!(doc.contains(&format!("* {} :area:\n", name)));
    }

    #[test]
    fn test_heading_width_counts_characters() {
        let db = Database::new(vec![], vec![Area::new("a1", "Café")], vec![], vec![]);
        let doc = render(&db);
        let line = line_starting(&doc, "* Café");
        let tag_start = line.chars().position(|c| c == ':').unwrap();
        assert_eq!(tag_start, DEFAULT_TAG_COLUMN);
    }

    #[test]
    fn test_area_notes_block_escapes_headings() {
        let mut area = Area::new("a1", "Home");
        area.notes = Some("first\n* not a heading\r\nlast".to_string());
        let db = Database::new(vec![], vec![area], vec![], vec![]);
        let doc = render(&db);
        assert!(
            doc.contains(":area:\n\n  first\n  ,* not a heading\n  last\n\n"),
            "doc:\n{}",
            doc
        );
    }

    #[test]
    fn test_project_and_to_do_nesting() {
        let mut project = Project::new("p1", "Renovate");
        project.area_id = Some("a1".to_string());
        project.status = ItemStatus::Completed;
        project.due_date = Some(at_midnight(2025, 2, 1));
        project.completion_date = Some(at_midnight(2025, 2, 3));

        let mut in_project = ToDo::new("td1", "Paint");
        in_project.project_id = Some("p1".to_string());
        in_project.today = true;
        in_project.activation_date = Some(at_midnight(2025, 1, 21));

        let mut in_area = ToDo::new("td2", "Water plants");
        in_area.area_id = Some("a1".to_string());
        in_area.status = ItemStatus::Cancelled;

        let db = Database::new(
            vec![],
            vec![Area::new("a1", "Home")],
            vec![project],
            vec![in_project, in_area],
        );
        let doc = render(&db);
        let body: Vec<&str> = doc.lines().skip(5).collect();

        assert!(body[0].starts_with("* Home "));
        assert!(body[1].starts_with("** DONE Renovate "));
        assert!(body[1].ends_with(":project:"));
        assert_eq!(body[2], "   DEADLINE: <2025-02-01 Sat>");
        assert_eq!(body[3], "   CLOSED: <2025-02-03 Mon>");
        assert!(body[4].starts_with("*** TODO Paint "));
        assert!(body[4].ends_with(":today:"));
        assert_eq!(body[5], "    SCHEDULED: <2025-01-21 Tue>");
        assert_eq!(body[6], "** CANCELLED Water plants");
        assert_eq!(body.len(), 7);
    }

    #[test]
    fn test_to_do_metadata_order() {
        let mut to_do = ToDo::new("td1", "Report");
        to_do.completion_date = Some(at_midnight(2025, 1, 9));
        to_do.due_date = Some(at_midnight(2025, 1, 8));
        to_do.activation_date = Some(at_midnight(2025, 1, 7));
        to_do.notes = Some("done early".to_string());

        let db = Database::new(vec![], vec![], vec![], vec![to_do]);
        let doc = render(&db);
        assert!(doc.ends_with(
            "** TODO Report\n\
             \x20  SCHEDULED: <2025-01-07 Tue>\n\
             \x20  DEADLINE: <2025-01-08 Wed>\n\
             \x20  CLOSED: <2025-01-09 Thu>\n\
             \n\
             \x20  done early\n\
             \n"
        ));
    }

    #[test]
    fn test_orphan_sections() {
        let mut orphan_member = ToDo::new("td1", "Sketch");
        orphan_member.project_id = Some("p1".to_string());
        let db = Database::new(
            vec![],
            vec![],
            vec![Project::new("p1", "Side quest")],
            vec![orphan_member, ToDo::new("td2", "Call mom")],
        );
        let doc = render(&db);

        let no_area = line_starting(&doc, "* No Area");
        assert!(no_area.ends_with(":noArea:"));
        assert_eq!(no_area.find(':'), Some(DEFAULT_TAG_COLUMN));
        let inbox = line_starting(&doc, "* Inbox");
        assert!(inbox.ends_with(":inbox:"));

        let body: Vec<&str> = doc.lines().skip(5).collect();
        assert!(body[1].starts_with("** TODO Side quest "));
        assert_eq!(body[2], "*** TODO Sketch");
        assert!(body[3].starts_with("* Inbox"));
        assert_eq!(body[4], "** TODO Call mom");
    }

    #[test]
    fn test_no_synthetic_sections_without_orphans() {
        let mut to_do = ToDo::new("td1", "Only in project");
        to_do.project_id = Some("ghost".to_string());
        let db = Database::new(vec![], vec![], vec![], vec![to_do]);
        let doc = render(&db);
        assert!(!doc.contains("* No Area"));
        assert!(!doc.contains("* Inbox"));
        // dangling project reference: the to-do has nowhere to render
        assert!(!doc.contains("Only in project"));
    }

    #[test]
    fn test_output_is_deterministic_apart_from_date() {
        let parser = RecordParser::new();
        let db = Database::new(
            parser.parse_tags("t1|||Work~~~t2|||Home|||t1~~~"),
            parser.parse_areas("a1|||Personal|||notes|||t1~~~"),
            parser.parse_projects("p1|||Plan|||||||||open~~~"),
            parser.parse_to_dos("td1|||Loose||||||||||||||||||||||||open~~~"),
        );
        let formatter = OrgFormatter::default();
        let strip = |doc: String| -> Vec<String> {
            doc.lines()
                .filter(|l| !l.starts_with("#+DATE:"))
                .map(str::to_string)
                .collect()
        };
        let first = strip(formatter.format_at(&db, day(2025, 1, 1)));
        let second = strip(formatter.format_at(&db, day(2026, 6, 30)));
        assert_eq!(first, second);
    }

    #[test]
    fn test_end_to_end_from_raw_text() {
        let parser = RecordParser::new();
        let db = Database::new(
            parser.parse_tags("t1|||Work~~~t2|||Home|||t1"),
            parser.parse_areas("a1|||Personal|||Some notes|||t1,t2~~~"),
            parser.parse_projects(""),
            parser.parse_to_dos(""),
        );
        let doc = render(&db);

        let heading = line_starting(&doc, "* Personal");
        assert!(heading.ends_with(":Work:Home:area:"));
        assert_eq!(heading.find(':'), Some(DEFAULT_TAG_COLUMN));
        assert!(doc.contains(&format!("{}\n\n  Some notes\n\n", heading)));
        assert_eq!(doc.lines().filter(|l| l.starts_with("* ")).count(), 1);
    }

    #[test]
    fn test_org_date_weekday_is_english() {
        assert_eq!(org_date(day(2025, 1, 20)), "<2025-01-20 Mon>");
        assert_eq!(org_date(day(2025, 1, 26)), "<2025-01-26 Sun>");
    }
}
