use super::common::*;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::projects::{ProjectService, DASHBOARD_PIN_HEADER};

#[tokio::test]
async fn create_handler_returns_unprocessable_for_blank_name() {
    let (service, _) = build_service();

    let response = crate::projects::router::create_handler::<MemoryProjects>(
        State(Arc::new(service)),
        axum::Json(draft("")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "project name is required");
}

#[tokio::test]
async fn create_handler_returns_bad_gateway_on_repository_failure() {
    let service = Arc::new(ProjectService::new(Arc::new(UnavailableProjects)));

    let response = crate::projects::router::create_handler::<UnavailableProjects>(
        State(service),
        axum::Json(draft("현장")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn create_route_accepts_stored_field_names() {
    let (service, _) = build_service();
    let router = project_router_with_service(service);

    let body = json!({
        "name": "성수 사무실",
        "type": "permit_work",
        "base_area": 45,
        "tasks": [{
            "id": "t-1",
            "isChecked": true,
            "category": "소방",
            "item_name": "스프링클러 이설",
            "unit_price": 45000,
            "area": 45
        }],
        "images": []
    });

    let response = router
        .oneshot(
            Request::post("/api/v1/projects")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["type"], "permit_work");
    assert_eq!(payload["tasks"][0]["item_name"], "스프링클러 이설");
    assert_eq!(payload["id"], "prj-001");
}

#[tokio::test]
async fn list_route_rejects_missing_pin() {
    let (service, _) = build_service();
    let router = project_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/projects")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_route_returns_summaries_with_pin() {
    let (service, _) = build_service();
    service.save(draft("판교 매장")).await.expect("save succeeds");
    let router = project_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/projects")
                .header(DASHBOARD_PIN_HEADER, PIN)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let rows = payload.as_array().expect("array payload");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "판교 매장");
    assert_eq!(rows[0]["total"], Value::from(4_640_000.0));
}

#[tokio::test]
async fn detail_route_returns_not_found_payload() {
    let (service, _) = build_service();
    let router = project_router_with_service(service);

    let response = router
        .oneshot(
            Request::get("/api/v1/projects/prj-404")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["project_id"], "prj-404");
}

#[tokio::test]
async fn detail_route_includes_summary() {
    let (service, _) = build_service();
    let saved = service.save(draft("홍대 주점")).await.expect("save succeeds");
    let router = project_router_with_service(service);

    let response = router
        .oneshot(
            Request::get(format!("/api/v1/projects/{}", saved.id))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["project"]["name"], "홍대 주점");
    assert_eq!(payload["summary"]["total_display"], "₩4,640,000");
}
