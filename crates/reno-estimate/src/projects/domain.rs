use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::estimate::{format_won, ConstructionTemplate, Estimate, Task, UploadedImage};

/// Author shown for projects saved without one.
pub const UNASSIGNED_AUTHOR: &str = "미지정";

/// Identifier wrapper for saved projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert payload for the projects table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type", default)]
    pub construction_type: ConstructionTemplate,
    #[serde(default)]
    pub base_area: Option<f64>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub images: Vec<UploadedImage>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProjectDraft {
    /// Snapshots the current editing state under a project name.
    pub fn from_estimate(
        estimate: &Estimate,
        name: impl Into<String>,
        author: Option<String>,
    ) -> Self {
        let notes = Some(estimate.memo().to_string()).filter(|memo| !memo.is_empty());
        Self {
            name: name.into(),
            author: author.filter(|author| !author.trim().is_empty()),
            construction_type: estimate.template(),
            base_area: estimate.base_area(),
            tasks: estimate.tasks().to_vec(),
            images: estimate.images().to_vec(),
            notes,
        }
    }
}

/// A saved estimate snapshot. Rows are never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type", default)]
    pub construction_type: ConstructionTemplate,
    #[serde(default)]
    pub base_area: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub images: Vec<UploadedImage>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn from_draft(id: ProjectId, draft: ProjectDraft, created_at: DateTime<Utc>) -> Self {
        let ProjectDraft {
            name,
            author,
            construction_type,
            base_area,
            tasks,
            images,
            notes,
        } = draft;

        Self {
            id,
            name,
            author,
            construction_type,
            base_area,
            notes,
            tasks,
            images,
            created_at,
        }
    }

    pub fn total(&self) -> f64 {
        self.tasks.iter().map(Task::included_total).sum()
    }

    /// Editing state equivalent to this snapshot; replaces whatever was loaded before.
    pub fn to_estimate(&self) -> Estimate {
        Estimate::from_parts(
            self.construction_type,
            self.base_area,
            self.tasks.clone(),
            self.images.clone(),
            self.notes.clone().unwrap_or_default(),
        )
    }

    pub fn summary(&self) -> ProjectSummary {
        let total = self.total();
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            author: self
                .author
                .clone()
                .filter(|author| !author.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_AUTHOR.to_string()),
            construction_type: self.construction_type,
            task_count: self.tasks.len(),
            image_count: self.images.len(),
            total,
            total_display: format_won(total),
            created_at: self.created_at,
        }
    }
}

/// Dashboard card for a saved project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    pub author: String,
    pub construction_type: ConstructionTemplate,
    pub task_count: usize,
    pub image_count: usize,
    pub total: f64,
    pub total_display: String,
    pub created_at: DateTime<Utc>,
}
