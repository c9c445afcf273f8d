use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post, put},
    Router,
};
use base64::Engine as _;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::store::SessionId;
use super::workspace::{EstimateWorkspace, PhotoUpload};
use super::SessionError;
use crate::analysis::AnalysisError;
use crate::estimate::input::coerce_base_area;
use crate::estimate::{
    import_tasks, Category, ConstructionTemplate, RawTaskEdit, RecommendationSet, TaskId,
};
use crate::photos::StorageError;
use crate::projects::{ProjectId, ProjectRepository, ProjectServiceError, RepositoryError};

type Workspace<R> = State<Arc<EstimateWorkspace<R>>>;

/// Router builder exposing the editing session endpoints.
pub fn session_router<R>(workspace: Arc<EstimateWorkspace<R>>) -> Router
where
    R: ProjectRepository + 'static,
{
    Router::new()
        .route("/api/v1/estimates", post(open_handler::<R>))
        .route(
            "/api/v1/estimates/:session_id",
            get(view_handler::<R>).delete(close_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/base-area",
            put(base_area_handler::<R>),
        )
        .route("/api/v1/estimates/:session_id/memo", put(memo_handler::<R>))
        .route(
            "/api/v1/estimates/:session_id/tasks",
            post(add_task_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/tasks/import",
            post(import_tasks_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/tasks/:task_id",
            patch(update_task_handler::<R>).delete(delete_task_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/sync-area",
            post(sync_area_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/labor-prices",
            post(labor_prices_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/recommendations",
            post(recommendations_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/photos",
            post(upload_photo_handler::<R>).delete(delete_photo_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/photos/analyze",
            post(analyze_photo_handler::<R>),
        )
        .route("/api/v1/estimates/:session_id/save", post(save_handler::<R>))
        .route("/api/v1/estimates/:session_id/load", post(load_handler::<R>))
        .route("/api/v1/estimates/:session_id/sheet", get(sheet_handler::<R>))
        .route(
            "/api/v1/estimates/:session_id/sheet.html",
            get(sheet_html_handler::<R>),
        )
        .route(
            "/api/v1/estimates/:session_id/export.csv",
            get(export_csv_handler::<R>),
        )
        .with_state(workspace)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenRequest {
    #[serde(default)]
    template: ConstructionTemplate,
    #[serde(default)]
    empty: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BaseAreaRequest {
    #[serde(default)]
    base_area: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MemoRequest {
    #[serde(default)]
    memo: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddTaskRequest {
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SyncAreaRequest {
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecommendationsRequest {
    #[serde(default)]
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoUploadRequest {
    file_name: String,
    data: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoPathQuery {
    path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeRequest {
    #[serde(default, alias = "imageUrl")]
    image_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoadRequest {
    project_id: String,
}

fn view_response<R>(workspace: &EstimateWorkspace<R>, id: &SessionId, status: StatusCode) -> Response
where
    R: ProjectRepository + 'static,
{
    match workspace.sessions().with(id, |estimate| estimate.view()) {
        Ok(view) => (status, axum::Json(view)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn open_handler<R>(
    State(workspace): Workspace<R>,
    request: Option<axum::Json<OpenRequest>>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let request = request.map(|axum::Json(request)| request).unwrap_or_default();
    let id = workspace.open(request.template, !request.empty);
    match workspace.sessions().with(&id, |estimate| estimate.view()) {
        Ok(view) => {
            let payload = json!({
                "session_id": id,
                "estimate": view,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn view_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    view_response(&workspace, &SessionId(session_id), StatusCode::OK)
}

pub(crate) async fn close_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.sessions().close(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => session_error_response(SessionError::SessionNotFound(id)),
    }
}

pub(crate) async fn base_area_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<BaseAreaRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    let base_area = coerce_base_area(&request.base_area);
    match workspace
        .sessions()
        .with(&id, |estimate| estimate.set_base_area(base_area))
    {
        Ok(()) => view_response(&workspace, &id, StatusCode::OK),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn memo_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<MemoRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace
        .sessions()
        .with(&id, |estimate| estimate.set_memo(request.memo))
    {
        Ok(()) => view_response(&workspace, &id, StatusCode::OK),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn add_task_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    request: Option<axum::Json<AddTaskRequest>>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    let category = request
        .and_then(|axum::Json(request)| request.category)
        .map(|label| Category::from_label_or_other(&label))
        .unwrap_or(Category::Other);

    match workspace
        .sessions()
        .with(&id, |estimate| estimate.add_task(category).clone())
    {
        Ok(task) => {
            let line_total = task.line_total();
            let payload = json!({
                "task": task,
                "line_total": line_total,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn import_tasks_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    body: axum::body::Bytes,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    let tasks = match import_tasks(body.as_ref()) {
        Ok(tasks) => tasks,
        Err(error) => return session_error_response(SessionError::Sheet(error)),
    };
    let imported = tasks.len();

    match workspace
        .sessions()
        .with(&id, |estimate| estimate.extend_tasks(tasks))
    {
        Ok(()) => {
            let payload = json!({ "imported": imported });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn update_task_handler<R>(
    State(workspace): Workspace<R>,
    Path((session_id, task_id)): Path<(String, String)>,
    axum::Json(edit): axum::Json<RawTaskEdit>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    let task_id = TaskId(task_id);
    match workspace.update_task(&id, &task_id, edit.into_update()) {
        Ok(()) => view_response(&workspace, &id, StatusCode::OK),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn delete_task_handler<R>(
    State(workspace): Workspace<R>,
    Path((session_id, task_id)): Path<(String, String)>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.delete_task(&id, &TaskId(task_id)) {
        Ok(()) => view_response(&workspace, &id, StatusCode::OK),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn sync_area_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    request: Option<axum::Json<SyncAreaRequest>>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let request = request.map(|axum::Json(request)| request).unwrap_or_default();
    if !request.confirm {
        return session_error_response(SessionError::InvalidInput(
            "syncing overwrites every task quantity; resend with confirm=true".to_string(),
        ));
    }

    let id = SessionId(session_id);
    match workspace.sync_area(&id) {
        Ok(updated) => {
            let payload = json!({ "updated": updated });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn labor_prices_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.apply_labor_prices(&id).await {
        Ok((snapshot, updated)) => {
            let payload = json!({
                "updated": updated,
                "source": snapshot.source,
                "index": snapshot.index,
                "message": snapshot.message,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn recommendations_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<RecommendationsRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    let recommendations = RecommendationSet::from_labels(&request.categories);
    match workspace
        .sessions()
        .with(&id, |estimate| estimate.apply_recommendations(&recommendations))
    {
        Ok(updated) => {
            let payload = json!({ "updated": updated });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn upload_photo_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<PhotoUploadRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let bytes = match base64::engine::general_purpose::STANDARD.decode(request.data.trim()) {
        Ok(bytes) => bytes,
        Err(_) => {
            return session_error_response(SessionError::InvalidInput(
                "photo data must be base64".to_string(),
            ))
        }
    };
    let upload = PhotoUpload {
        file_name: request.file_name,
        bytes,
        category: request
            .category
            .as_deref()
            .and_then(Category::from_label),
    };

    let id = SessionId(session_id);
    match workspace.upload_photo(&id, upload).await {
        Ok(image) => (StatusCode::CREATED, axum::Json(image)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn delete_photo_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    Query(query): Query<PhotoPathQuery>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.delete_photo(&id, &query.path).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn analyze_photo_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnalyzeRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.analyze_photo(&id, &request.image_url).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn save_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<SaveRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.save(&id, &request.name, request.author).await {
        Ok(project) => {
            let payload = json!({
                "project_id": project.id,
                "summary": project.summary(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn load_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<LoadRequest>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let id = SessionId(session_id);
    match workspace.load(&id, &ProjectId(request.project_id)).await {
        Ok(_) => view_response(&workspace, &id, StatusCode::OK),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn sheet_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    match workspace.sheet(&SessionId(session_id), Utc::now().date_naive()) {
        Ok(sheet) => (StatusCode::OK, axum::Json(sheet)).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn sheet_html_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    match workspace.sheet(&SessionId(session_id), Utc::now().date_naive()) {
        Ok(sheet) => Html(sheet.render_html()).into_response(),
        Err(error) => session_error_response(error),
    }
}

pub(crate) async fn export_csv_handler<R>(
    State(workspace): Workspace<R>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ProjectRepository + 'static,
{
    let sheet = match workspace.sheet(&SessionId(session_id), Utc::now().date_naive()) {
        Ok(sheet) => sheet,
        Err(error) => return session_error_response(error),
    };

    let mut buffer = Vec::new();
    if let Err(error) = sheet.write_csv(&mut buffer) {
        return session_error_response(SessionError::Sheet(error));
    }

    let file_name = sheet.file_name.replace(".pdf", ".csv");
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename*=UTF-8''{}", urlencoding::encode(&file_name)),
            ),
        ],
        buffer,
    )
        .into_response()
}

pub(crate) fn session_error_response(error: SessionError) -> Response {
    let status = match &error {
        SessionError::SessionNotFound(_)
        | SessionError::TaskNotFound(_)
        | SessionError::PhotoNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::BaseAreaUnset | SessionError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SessionError::Sheet(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Labor(_) => StatusCode::BAD_REQUEST,
        SessionError::Storage(StorageError::NotConfigured)
        | SessionError::Analysis(AnalysisError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Analysis(AnalysisError::MissingImageUrl) => StatusCode::BAD_REQUEST,
        SessionError::Storage(_) | SessionError::Analysis(_) => StatusCode::BAD_GATEWAY,
        SessionError::Project(ProjectServiceError::MissingName) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SessionError::Project(ProjectServiceError::Unauthorized) => StatusCode::UNAUTHORIZED,
        SessionError::Project(ProjectServiceError::Repository(RepositoryError::NotFound)) => {
            StatusCode::NOT_FOUND
        }
        SessionError::Project(ProjectServiceError::Repository(_)) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
