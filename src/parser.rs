//! Parser for the delimited text emitted by the Things 3 automation scripts.
//!
//! Each script joins a record's fields with `|||` and records with `~~~`.
//! Fields are positional and many are optional, so parsing is lenient:
//! short records and records without an id are dropped, missing optional
//! fields become `None`, and dates that match no known format are omitted.
//! Nothing here returns an error.

use crate::models::{Area, ItemStatus, Project, Tag, ToDo};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Separator between the fields of one record.
pub const FIELD_SEPARATOR: &str = "|||";

/// Separator between records.
pub const RECORD_SEPARATOR: &str = "~~~";

/// Minimum field counts per record kind.
const TAG_MIN_FIELDS: usize = 2;
const AREA_MIN_FIELDS: usize = 2;
const PROJECT_MIN_FIELDS: usize = 5;
const TO_DO_MIN_FIELDS: usize = 10;

/// Wall-clock formats tried in order; the first that parses wins.
const VERBOSE_DATE_FORMATS: [&str; 3] = [
    // Monday, January 20, 2025 at 3:04:05 PM
    "%A, %B %d, %Y at %I:%M:%S %p",
    // January 20, 2025 at 3:04:05 PM
    "%B %d, %Y at %I:%M:%S %p",
    // Monday, January 20, 2025 at 15:04:05
    "%A, %B %d, %Y at %H:%M:%S",
];

/// 2025-01-20 15:04:05 +0100
const OFFSET_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// 2025-01-20
const BARE_DATE_FORMAT: &str = "%Y-%m-%d";

/// The trimmed fields of one candidate record.
///
/// Indexing past the end yields an empty field rather than panicking.
struct Fields<'a> {
    values: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn split(record: &'a str, separator: &str) -> Self {
        Self {
            values: record.split(separator).map(str::trim).collect(),
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn text(&self, index: usize) -> &'a str {
        self.values.get(index).copied().unwrap_or("")
    }

    fn optional(&self, index: usize) -> Option<String> {
        let value = self.text(index);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn date(&self, index: usize) -> Option<NaiveDateTime> {
        parse_date(self.text(index))
    }

    fn status(&self, index: usize) -> ItemStatus {
        ItemStatus::parse(self.text(index))
    }

    fn flag(&self, index: usize) -> bool {
        self.text(index).eq_ignore_ascii_case("true")
    }

    fn tag_ids(&self, index: usize) -> Vec<String> {
        parse_tag_ids(self.text(index))
    }
}

/// Converts raw script output into typed records.
#[derive(Debug, Clone)]
pub struct RecordParser {
    field_separator: String,
    record_separator: String,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser {
    /// Parser for the standard `|||` / `~~~` wire format.
    pub fn new() -> Self {
        Self::with_separators(FIELD_SEPARATOR, RECORD_SEPARATOR)
    }

    pub fn with_separators(field_separator: &str, record_separator: &str) -> Self {
        Self {
            field_separator: field_separator.to_string(),
            record_separator: record_separator.to_string(),
        }
    }

    /// Split `output` into records and build each one that qualifies.
    ///
    /// A record qualifies when it has at least `min_fields` fields and a
    /// non-empty id in the first field.
    fn parse_records<T>(
        &self,
        kind: &'static str,
        output: &str,
        min_fields: usize,
        build: impl Fn(&str, &Fields<'_>) -> T,
    ) -> Vec<T> {
        let mut dropped = 0usize;
        let records: Vec<T> = output
            .split(self.record_separator.as_str())
            .filter_map(|record| {
                let fields = Fields::split(record, &self.field_separator);
                let id = fields.text(0);
                if fields.len() < min_fields || id.is_empty() {
                    if !record.trim().is_empty() {
                        dropped += 1;
                    }
                    return None;
                }
                Some(build(id, &fields))
            })
            .collect();

        if dropped > 0 {
            tracing::debug!(kind, dropped, "dropped malformed records");
        }
        tracing::trace!(kind, parsed = records.len(), "parsed records");
        records
    }

    /// Fields: `[id, name, parent-tag-id?]`
    pub fn parse_tags(&self, output: &str) -> Vec<Tag> {
        self.parse_records("tags", output, TAG_MIN_FIELDS, |id, f| Tag {
            id: id.to_string(),
            name: f.text(1).to_string(),
            parent_tag_id: f.optional(2),
        })
    }

    /// Fields: `[id, name, notes?, tag-ids?]`
    pub fn parse_areas(&self, output: &str) -> Vec<Area> {
        self.parse_records("areas", output, AREA_MIN_FIELDS, |id, f| Area {
            id: id.to_string(),
            name: f.text(1).to_string(),
            notes: f.optional(2),
            tag_ids: f.tag_ids(3),
        })
    }

    /// Fields: `[id, name, notes?, area-id?, status, due?, completed?, tag-ids?]`
    pub fn parse_projects(&self, output: &str) -> Vec<Project> {
        self.parse_records("projects", output, PROJECT_MIN_FIELDS, |id, f| Project {
            id: id.to_string(),
            name: f.text(1).to_string(),
            notes: f.optional(2),
            area_id: f.optional(3),
            status: f.status(4),
            due_date: f.date(5),
            completion_date: f.date(6),
            tag_ids: f.tag_ids(7),
        })
    }

    /// Fields: `[id, name, notes?, created?, modified?, due?, activated?,
    /// completed?, cancelled?, status, today?, project-id?, area-id?, tag-ids?]`
    pub fn parse_to_dos(&self, output: &str) -> Vec<ToDo> {
        self.parse_records("todos", output, TO_DO_MIN_FIELDS, |id, f| ToDo {
            id: id.to_string(),
            name: f.text(1).to_string(),
            notes: f.optional(2),
            creation_date: f.date(3),
            modification_date: f.date(4),
            due_date: f.date(5),
            activation_date: f.date(6),
            completion_date: f.date(7),
            cancellation_date: f.date(8),
            status: f.status(9),
            today: f.flag(10),
            project_id: f.optional(11),
            area_id: f.optional(12),
            tag_ids: f.tag_ids(13),
        })
    }
}

/// Split a comma-joined tag id list, dropping empty entries.
pub fn parse_tag_ids(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a date as AppleScript renders it, trying each known format in order.
///
/// Timestamps with an explicit offset keep their wall-clock time in that
/// offset. A bare date maps to midnight.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    // macOS separates the time and AM/PM with U+202F on recent releases
    let normalized: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '\u{202f}' | '\u{a0}' => ' ',
            other => other,
        })
        .collect();
    if normalized.is_empty() {
        return None;
    }

    for format in VERBOSE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_str(&normalized, OFFSET_DATE_FORMAT) {
        return Some(parsed.naive_local());
    }

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, BARE_DATE_FORMAT) {
        return Some(date.and_time(NaiveTime::MIN));
    }

    tracing::trace!(value, "unparseable date omitted");
    None
}
