//! The four data-extraction scripts.
//!
//! Every script emits one record per item, fields joined with
//! [`FIELD_SEPARATOR`] and records terminated by [`RECORD_SEPARATOR`], in the
//! field order the parser expects. Optional properties are read inside `try`
//! blocks so a missing value becomes an empty field instead of a script error.

use super::AutomationCommand;
use crate::parser::{FIELD_SEPARATOR, RECORD_SEPARATOR};

/// The record kinds that can be fetched from Things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Tags,
    Areas,
    Projects,
    ToDos,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Tags,
        RecordKind::Areas,
        RecordKind::Projects,
        RecordKind::ToDos,
    ];

    /// Label used for logging, errors and replay file names.
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Tags => "tags",
            RecordKind::Areas => "areas",
            RecordKind::Projects => "projects",
            RecordKind::ToDos => "todos",
        }
    }

    /// Build the automation command that fetches this kind.
    pub fn command(&self) -> AutomationCommand {
        let script = match self {
            RecordKind::Tags => fetch_tags_script(),
            RecordKind::Areas => fetch_areas_script(),
            RecordKind::Projects => fetch_projects_script(),
            RecordKind::ToDos => fetch_to_dos_script(),
        };
        AutomationCommand::new(self.label(), script)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Join AppleScript variable names into a record expression.
///
/// `record_expression(&["a", "b"])` yields
/// `a & "|||" & b & "~~~"`.
fn record_expression(vars: &[&str]) -> String {
    let separator = format!(" & \"{}\" & ", FIELD_SEPARATOR);
    format!(
        "{} & \"{}\"",
        vars.join(&separator),
        RECORD_SEPARATOR
    )
}

/// AppleScript lines that collect `item`'s tag ids into `var`, comma-joined.
fn tag_ids_block(item: &str, var: &str) -> String {
    format!(
        r#"        set {var} to ""
        try
            repeat with t in (tags of {item})
                set {var} to {var} & (id of t) & ","
            end repeat
        end try"#
    )
}

/// AppleScript lines that read an optional property into `var`.
fn optional_block(var: &str, expression: &str) -> String {
    format!(
        r#"        set {var} to ""
        try
            set {var} to {expression}
        end try"#
    )
}

fn fetch_tags_script() -> String {
    format!(
        r#"tell application "Things3"
    set output to ""
    repeat with t in tags
        set tid to id of t
        set tname to name of t
{parent}
        set output to output & {record}
    end repeat
    return output
end tell"#,
        parent = optional_block("tparent", "id of parent tag of t"),
        record = record_expression(&["tid", "tname", "tparent"]),
    )
}

fn fetch_areas_script() -> String {
    format!(
        r#"tell application "Things3"
    set output to ""
    repeat with a in areas
        set aid to id of a
        set aname to name of a
{notes}
{tags}
        set output to output & {record}
    end repeat
    return output
end tell"#,
        notes = optional_block("anotes", "notes of a"),
        tags = tag_ids_block("a", "atags"),
        record = record_expression(&["aid", "aname", "anotes", "atags"]),
    )
}

fn fetch_projects_script() -> String {
    format!(
        r#"tell application "Things3"
    set output to ""
    repeat with p in projects
        set pid to id of p
        set pname to name of p
{notes}
{area}
        set pstatus to status of p as string
{due}
{completion}
{tags}
        set output to output & {record}
    end repeat
    return output
end tell"#,
        notes = optional_block("pnotes", "notes of p"),
        area = optional_block("parea", "id of area of p"),
        due = optional_block("pdue", "due date of p as string"),
        completion = optional_block("pcompletion", "completion date of p as string"),
        tags = tag_ids_block("p", "ptags"),
        record = record_expression(&[
            "pid",
            "pname",
            "pnotes",
            "parea",
            "pstatus",
            "pdue",
            "pcompletion",
            "ptags",
        ]),
    )
}

fn fetch_to_dos_script() -> String {
    format!(
        r#"tell application "Things3"
    set output to ""
    set todayIds to {{}}
    try
        set todayIds to id of to dos of list id "TMTodayListSource"
    end try
    repeat with td in to dos
        set tdid to id of td
        set tdname to name of td
{notes}
{creation}
{modification}
{due}
{activation}
{completion}
{cancellation}
        set tdstatus to status of td as string
        set tdtoday to "false"
        if todayIds contains tdid then set tdtoday to "true"
{project}
{area}
{tags}
        set output to output & {record}
    end repeat
    return output
end tell"#,
        notes = optional_block("tdnotes", "notes of td"),
        creation = optional_block("tdcreation", "creation date of td as string"),
        modification = optional_block("tdmod", "modification date of td as string"),
        due = optional_block("tddue", "due date of td as string"),
        activation = optional_block("tdactivation", "activation date of td as string"),
        completion = optional_block("tdcompletion", "completion date of td as string"),
        cancellation = optional_block("tdcancellation", "cancellation date of td as string"),
        project = optional_block("tdproject", "id of project of td"),
        area = optional_block("tdarea", "id of area of td"),
        tags = tag_ids_block("td", "tdtags"),
        record = record_expression(&[
            "tdid",
            "tdname",
            "tdnotes",
            "tdcreation",
            "tdmod",
            "tddue",
            "tdactivation",
            "tdcompletion",
            "tdcancellation",
            "tdstatus",
            "tdtoday",
            "tdproject",
            "tdarea",
            "tdtags",
        ]),
    )
}
