//! Data models for exported Things 3 entities.
//!
//! This module defines the core data structures:
//! - `Tag` - Labels, optionally nested under a parent tag
//! - `Area` - Top-level groupings of projects and to-dos
//! - `Project` - Units of work, optionally inside an area
//! - `ToDo` - Individual tasks, optionally inside a project and/or area
//! - `Database` - The four collections from a single acquisition pass
//!
//! All records are built once by the parser and never mutated afterwards.
//! References between records are plain ids and may dangle.

pub mod database;

pub use database::{Database, IntegrityWarning, Statistics};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by projects and to-dos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Open,
    Completed,
    /// Things emits both "cancelled" and "canceled"; both land here.
    Cancelled,
}

impl ItemStatus {
    /// Parse a status string leniently.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Anything unrecognised falls back to `Open`.
    pub fn parse(s: &str) -> Self {
        match Self::recognize(s) {
            Some(status) => status,
            None => {
                tracing::trace!(status = s, "unrecognised status, defaulting to open");
                ItemStatus::Open
            }
        }
    }

    /// Strict variant of [`ItemStatus::parse`]: `None` for unknown strings.
    pub fn recognize(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Some(ItemStatus::Open),
            "completed" => Some(ItemStatus::Completed),
            "cancelled" | "canceled" => Some(ItemStatus::Cancelled),
            _ => None,
        }
    }

    /// Org-mode TODO keyword for this status.
    pub fn org_keyword(&self) -> &'static str {
        match self {
            ItemStatus::Open => "TODO",
            ItemStatus::Completed => "DONE",
            ItemStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Open => "open",
            ItemStatus::Completed => "completed",
            ItemStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A tag, attachable to areas, projects and to-dos by id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier assigned by Things
    pub id: String,

    pub name: String,

    /// Parent tag id; not validated against the tag list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tag_id: Option<String>,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_tag_id: None,
        }
    }
}

/// A top-level area of responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Tag ids in the order Things reports them (duplicates kept)
    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl Area {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: None,
            tag_ids: Vec::new(),
        }
    }
}

/// A project, optionally filed under an area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Owning area; `None` makes this an orphan project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: None,
            area_id: None,
            status: ItemStatus::default(),
            due_date: None,
            completion_date: None,
            tag_ids: Vec::new(),
        }
    }
}

/// A single to-do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToDo {
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDateTime>,

    /// Start date in Things; rendered as SCHEDULED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDateTime>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<NaiveDateTime>,

    #[serde(default)]
    pub status: ItemStatus,

    /// Whether the to-do sits in the Today list
    #[serde(default)]
    pub today: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_id: Option<String>,

    #[serde(default)]
    pub tag_ids: Vec<String>,
}

impl ToDo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            notes: None,
            creation_date: None,
            modification_date: None,
            due_date: None,
            activation_date: None,
            completion_date: None,
            cancellation_date: None,
            status: ItemStatus::default(),
            today: false,
            project_id: None,
            area_id: None,
            tag_ids: Vec::new(),
        }
    }
}
