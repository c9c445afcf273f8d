use async_trait::async_trait;

use super::domain::{Project, ProjectDraft, ProjectId};

/// Storage abstraction for saved projects. Only inserts and reads are exposed.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<Project>, RepositoryError>;
    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("project not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("repository returned malformed data: {0}")]
    Malformed(String),
}
