use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;

use super::domain::{ProjectDraft, ProjectId};
use super::repository::{ProjectRepository, RepositoryError};
use super::service::{ProjectService, ProjectServiceError};

/// Header carrying the dashboard PIN.
pub const DASHBOARD_PIN_HEADER: &str = "x-dashboard-pin";

/// Router builder exposing saved-project endpoints.
pub fn project_router<R>(service: Arc<ProjectService<R>>) -> Router
where
    R: ProjectRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/projects",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/v1/projects/:project_id", get(detail_handler::<R>))
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    axum::Json(draft): axum::Json<ProjectDraft>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    match service.save(draft).await {
        Ok(project) => (StatusCode::CREATED, axum::Json(project)).into_response(),
        Err(error) => project_error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    headers: HeaderMap,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let pin = headers
        .get(DASHBOARD_PIN_HEADER)
        .and_then(|value| value.to_str().ok());

    match service.dashboard(pin).await {
        Ok(summaries) => (StatusCode::OK, axum::Json(summaries)).into_response(),
        Err(error) => project_error_response(error),
    }
}

pub(crate) async fn detail_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    Path(project_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = ProjectId(project_id);
    match service.get(&id).await {
        Ok(project) => {
            let payload = json!({
                "project": project,
                "summary": project.summary(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(ProjectServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": "project not found",
                "project_id": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => project_error_response(error),
    }
}

pub(crate) fn project_error_response(error: ProjectServiceError) -> Response {
    let status = match &error {
        ProjectServiceError::MissingName => StatusCode::UNPROCESSABLE_ENTITY,
        ProjectServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
        ProjectServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ProjectServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::BAD_GATEWAY
        }
        ProjectServiceError::Repository(RepositoryError::Malformed(_)) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
