use crate::infra::{mask, AppState};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use reno_estimate::analysis::SiteAnalysis;
use reno_estimate::error::AppError;
use reno_estimate::labor::parse_target_date;
use reno_estimate::projects::{project_router, ProjectRepository, ProjectService};
use reno_estimate::sessions::{session_router, EstimateWorkspace};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LaborIndexQuery {
    #[serde(default)]
    pub(crate) date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeImageRequest {
    #[serde(default, alias = "imageUrl")]
    pub(crate) image_url: String,
}

pub(crate) fn with_estimate_routes<R>(
    projects: Arc<ProjectService<R>>,
    workspace: Arc<EstimateWorkspace<R>>,
) -> axum::Router
where
    R: ProjectRepository + 'static,
{
    project_router(projects)
        .merge(session_router(workspace))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/labor-index",
            axum::routing::get(labor_index_endpoint),
        )
        .route(
            "/api/v1/analyze-image",
            axum::routing::post(analyze_image_endpoint),
        )
        .route(
            "/api/v1/diagnostics",
            axum::routing::get(diagnostics_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Current index, or the simulated historical value when `date` is given.
pub(crate) async fn labor_index_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<LaborIndexQuery>,
) -> Result<Response, AppError> {
    let labor = &state.collaborators.labor;
    match query.date.as_deref().filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => {
            let target = parse_target_date(raw)?;
            let historical = labor.historical(target).await?;
            Ok(Json(historical).into_response())
        }
        None => {
            let snapshot = labor.current().await?;
            Ok(Json(snapshot).into_response())
        }
    }
}

pub(crate) async fn analyze_image_endpoint(
    Extension(state): Extension<AppState>,
    Json(request): Json<AnalyzeImageRequest>,
) -> Result<Json<SiteAnalysis>, AppError> {
    let analysis = state
        .collaborators
        .analyzer
        .analyze(&request.image_url)
        .await
        .map_err(|err| {
            warn!(error = %err, "site analysis failed");
            err
        })?;
    Ok(Json(analysis))
}

/// Configuration and connectivity report for each collaborator.
pub(crate) async fn diagnostics_endpoint(Extension(state): Extension<AppState>) -> Json<Value> {
    let collaborators = &state.collaborators;

    let supabase = match &collaborators.supabase_url {
        Some(url) => json!({ "configured": true, "url": mask(url, 15) }),
        None => json!({ "configured": false, "url": Value::Null }),
    };

    let storage = match collaborators.photos.check_connection().await {
        Ok(()) => json!({
            "status": "ok",
            "bucket": collaborators.photo_bucket,
        }),
        Err(err) => json!({
            "status": "error",
            "bucket": collaborators.photo_bucket,
            "detail": err.to_string(),
        }),
    };

    let vision = match collaborators.analyzer.check_connection().await {
        Ok(_) => json!({ "status": "ok" }),
        Err(err) => json!({ "status": "error", "detail": err.to_string() }),
    };

    let labor = match collaborators.labor.current().await {
        Ok(snapshot) => json!({
            "status": "ok",
            "source": snapshot.source,
            "index": snapshot.index,
        }),
        Err(err) => json!({ "status": "error", "detail": err.to_string() }),
    };

    Json(json!({
        "supabase": supabase,
        "storage": storage,
        "vision": vision,
        "labor_index": labor,
    }))
}
