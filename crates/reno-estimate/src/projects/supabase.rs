use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::domain::{Project, ProjectDraft, ProjectId};
use super::repository::{ProjectRepository, RepositoryError};
use crate::supabase::{ensure_success, SupabaseClient};

/// Projects table behind the hosted PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseProjectRepository {
    client: SupabaseClient,
    table: String,
}

impl SupabaseProjectRepository {
    pub fn new(client: SupabaseClient, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    fn table_path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    async fn read_rows<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Vec<T>, RepositoryError> {
        let response = ensure_success(response)
            .await
            .map_err(|failure| RepositoryError::Unavailable(failure.to_string()))?;
        let body = response.bytes().await.map_err(unavailable)?;
        serde_json::from_slice(&body).map_err(|err| RepositoryError::Malformed(err.to_string()))
    }
}

fn unavailable(err: reqwest::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

#[async_trait]
impl ProjectRepository for SupabaseProjectRepository {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError> {
        let response = self
            .client
            .post(&self.table_path())
            .header("Prefer", "return=representation")
            .json(&draft)
            .send()
            .await
            .map_err(unavailable)?;

        let mut rows: Vec<Project> = Self::read_rows(response).await?;
        if rows.is_empty() {
            return Err(RepositoryError::Malformed(
                "insert returned no representation".to_string(),
            ));
        }
        let project = rows.swap_remove(0);
        debug!(project_id = %project.id, table = %self.table, "project row inserted");
        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let response = self
            .client
            .get(&self.table_path())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(unavailable)?;

        Self::read_rows(response).await
    }

    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let filter = format!("eq.{}", id.0);
        let response = self
            .client
            .get(&self.table_path())
            .query(&[("select", "*"), ("id", filter.as_str())])
            .send()
            .await
            .map_err(unavailable)?;

        let rows: Vec<Project> = Self::read_rows(response).await?;
        Ok(rows.into_iter().next())
    }
}
