//! The in-memory relational view of one acquisition pass.
//!
//! Collections keep the order Things reported them in. Lookups are linear
//! scans; a single user's task data is hundreds of records, not millions.

use super::{Area, Project, Tag, ToDo};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// All records exported from Things 3.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub tags: Vec<Tag>,
    pub areas: Vec<Area>,
    pub projects: Vec<Project>,
    pub to_dos: Vec<ToDo>,
}

/// Record counts, reported alongside every export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub areas: usize,
    pub projects: usize,
    pub to_dos: usize,
    pub tags: usize,
}

/// A reference that does not resolve inside the database.
///
/// Dangling references are legal; these are informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    MissingArea { project_id: String, area_id: String },
    MissingProject { to_do_id: String, project_id: String },
    ToDoMissingArea { to_do_id: String, area_id: String },
    MissingTag { owner_id: String, tag_id: String },
    MissingParentTag { tag_id: String, parent_tag_id: String },
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::MissingArea {
                project_id,
                area_id,
            } => write!(f, "project {} references missing area {}", project_id, area_id),
            IntegrityWarning::MissingProject {
                to_do_id,
                project_id,
            } => write!(
                f,
                "to-do {} references missing project {}",
                to_do_id, project_id
            ),
            IntegrityWarning::ToDoMissingArea { to_do_id, area_id } => {
                write!(f, "to-do {} references missing area {}", to_do_id, area_id)
            }
            IntegrityWarning::MissingTag { owner_id, tag_id } => {
                write!(f, "{} references missing tag {}", owner_id, tag_id)
            }
            IntegrityWarning::MissingParentTag {
                tag_id,
                parent_tag_id,
            } => write!(
                f,
                "tag {} references missing parent tag {}",
                tag_id, parent_tag_id
            ),
        }
    }
}

impl Database {
    pub fn new(tags: Vec<Tag>, areas: Vec<Area>, projects: Vec<Project>, to_dos: Vec<ToDo>) -> Self {
        Self {
            tags,
            areas,
            projects,
            to_dos,
        }
    }

    /// First tag with the given id.
    pub fn tag(&self, id: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    /// Projects filed under an area, in original order.
    pub fn projects_for_area(&self, area_id: &str) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|p| p.area_id.as_deref() == Some(area_id))
            .collect()
    }

    /// To-dos belonging to a project, in original order.
    pub fn to_dos_for_project(&self, project_id: &str) -> Vec<&ToDo> {
        self.to_dos
            .iter()
            .filter(|t| t.project_id.as_deref() == Some(project_id))
            .collect()
    }

    /// To-dos filed directly under an area (not inside a project).
    pub fn to_dos_for_area(&self, area_id: &str) -> Vec<&ToDo> {
        self.to_dos
            .iter()
            .filter(|t| t.area_id.as_deref() == Some(area_id) && t.project_id.is_none())
            .collect()
    }

    /// Projects without an area.
    pub fn orphan_projects(&self) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.area_id.is_none()).collect()
    }

    /// To-dos with neither a project nor an area.
    ///
    /// A to-do with only a project id is not an orphan, even when that
    /// project is itself orphaned or missing.
    pub fn orphan_to_dos(&self) -> Vec<&ToDo> {
        self.to_dos
            .iter()
            .filter(|t| t.project_id.is_none() && t.area_id.is_none())
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            areas: self.areas.len(),
            projects: self.projects.len(),
            to_dos: self.to_dos.len(),
            tags: self.tags.len(),
        }
    }

    /// Collect every reference that does not resolve.
    ///
    /// Order: tag parents, area tags, project links, to-do links.
    pub fn integrity_warnings(&self) -> Vec<IntegrityWarning> {
        let tag_ids: HashSet<&str> = self.tags.iter().map(|t| t.id.as_str()).collect();
        let area_ids: HashSet<&str> = self.areas.iter().map(|a| a.id.as_str()).collect();
        let project_ids: HashSet<&str> = self.projects.iter().map(|p| p.id.as_str()).collect();

        let mut warnings = Vec::new();
        let check_tags = |owner_id: &str, ids: &[String], out: &mut Vec<IntegrityWarning>| {
            for id in ids {
                if !tag_ids.contains(id.as_str()) {
                    out.push(IntegrityWarning::MissingTag {
                        owner_id: owner_id.to_string(),
                        tag_id: id.clone(),
                    });
                }
            }
        };

        for tag in &self.tags {
            if let Some(parent) = &tag.parent_tag_id
                && !tag_ids.contains(parent.as_str())
            {
                warnings.push(IntegrityWarning::MissingParentTag {
                    tag_id: tag.id.clone(),
                    parent_tag_id: parent.clone(),
                });
            }
        }

        for area in &self.areas {
            check_tags(&area.id, &area.tag_ids, &mut warnings);
        }

        for project in &self.projects {
            if let Some(area_id) = &project.area_id
                && !area_ids.contains(area_id.as_str())
            {
                warnings.push(IntegrityWarning::MissingArea {
                    project_id: project.id.clone(),
                    area_id: area_id.clone(),
                });
            }
            check_tags(&project.id, &project.tag_ids, &mut warnings);
        }

        for to_do in &self.to_dos {
            if let Some(project_id) = &to_do.project_id
                && !project_ids.contains(project_id.as_str())
            {
                warnings.push(IntegrityWarning::MissingProject {
                    to_do_id: to_do.id.clone(),
                    project_id: project_id.clone(),
                });
            }
            if let Some(area_id) = &to_do.area_id
                && !area_ids.contains(area_id.as_str())
            {
                warnings.push(IntegrityWarning::ToDoMissingArea {
                    to_do_id: to_do.id.clone(),
                    area_id: area_id.clone(),
                });
            }
            check_tags(&to_do.id, &to_do.tag_ids, &mut warnings);
        }

        warnings
    }
}
