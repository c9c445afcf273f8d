use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{Project, ProjectDraft, ProjectId, ProjectSummary};
use super::repository::{ProjectRepository, RepositoryError};
use crate::estimate::Estimate;

/// Default PIN guarding the saved-project dashboard.
pub const DEFAULT_DASHBOARD_PIN: &str = "1234";

/// Service wrapping project persistence with input validation and the dashboard gate.
pub struct ProjectService<R> {
    repository: Arc<R>,
    dashboard_pin: String,
}

impl<R> ProjectService<R>
where
    R: ProjectRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_pin(repository, DEFAULT_DASHBOARD_PIN)
    }

    pub fn with_pin(repository: Arc<R>, dashboard_pin: impl Into<String>) -> Self {
        Self {
            repository,
            dashboard_pin: dashboard_pin.into(),
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Persist a new project row. Blank names are rejected before the repository is touched.
    pub async fn save(&self, mut draft: ProjectDraft) -> Result<Project, ProjectServiceError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ProjectServiceError::MissingName);
        }
        draft.name = name.to_string();

        match self.repository.insert(draft).await {
            Ok(project) => {
                info!(project_id = %project.id, tasks = project.tasks.len(), "project saved");
                Ok(project)
            }
            Err(err) => {
                warn!(error = %err, "project save failed");
                Err(err.into())
            }
        }
    }

    pub async fn save_estimate(
        &self,
        estimate: &Estimate,
        name: &str,
        author: Option<String>,
    ) -> Result<Project, ProjectServiceError> {
        self.save(ProjectDraft::from_estimate(estimate, name, author))
            .await
    }

    pub async fn list(&self) -> Result<Vec<Project>, ProjectServiceError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: &ProjectId) -> Result<Project, ProjectServiceError> {
        let project = self
            .repository
            .fetch(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(project)
    }

    pub fn verify_pin(&self, pin: Option<&str>) -> Result<(), ProjectServiceError> {
        match pin.map(str::trim) {
            Some(candidate) if candidate == self.dashboard_pin => Ok(()),
            _ => Err(ProjectServiceError::Unauthorized),
        }
    }

    /// Summaries for the dashboard, newest first.
    pub async fn dashboard(
        &self,
        pin: Option<&str>,
    ) -> Result<Vec<ProjectSummary>, ProjectServiceError> {
        self.verify_pin(pin)?;
        let projects = self.list().await?;
        Ok(projects.iter().map(Project::summary).collect())
    }
}

/// Error raised by the project service.
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("project name is required")]
    MissingName,
    #[error("dashboard pin rejected")]
    Unauthorized,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
