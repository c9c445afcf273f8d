use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::estimate::{Category, ConstructionTemplate, Estimate, Task, TaskId};
use crate::projects::domain::{Project, ProjectDraft, ProjectId};
use crate::projects::repository::{ProjectRepository, RepositoryError};
use crate::projects::{project_router, ProjectService};

pub(super) const PIN: &str = "4821";

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn task(id: &str, category: Category, unit_price: f64, quantity: f64) -> Task {
    Task {
        id: TaskId(id.to_string()),
        included: true,
        category,
        name: format!("{} 공사", category.label()),
        description: String::new(),
        unit_price,
        quantity,
    }
}

pub(super) fn draft(name: &str) -> ProjectDraft {
    ProjectDraft {
        name: name.to_string(),
        author: Some("김현장".to_string()),
        construction_type: ConstructionTemplate::Interior,
        base_area: Some(32.0),
        tasks: vec![
            task("t-floor", Category::Flooring, 80_000.0, 32.0),
            task("t-wall", Category::Wall, 65_000.0, 32.0),
        ],
        images: Vec::new(),
        notes: Some("주말 작업 불가".to_string()),
    }
}

pub(super) fn build_service() -> (ProjectService<MemoryProjects>, Arc<MemoryProjects>) {
    let repository = Arc::new(MemoryProjects::default());
    let service = ProjectService::with_pin(repository.clone(), PIN);
    (service, repository)
}

pub(super) fn seeded_estimate() -> Estimate {
    let mut estimate = Estimate::new(ConstructionTemplate::Restoration);
    estimate.set_base_area(Some(20.0));
    estimate.set_memo("엘리베이터 사용 협의 필요");
    estimate
}

/// Keeps rows in insertion order and stamps each one a minute after the last.
#[derive(Default)]
pub(super) struct MemoryProjects {
    rows: Mutex<Vec<Project>>,
    sequence: AtomicU64,
    pub(super) inserts: AtomicUsize,
}

impl MemoryProjects {
    pub(super) fn rows(&self) -> Vec<Project> {
        self.rows.lock().expect("repository mutex poisoned").clone()
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjects {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let created_at = base_time() + Duration::minutes(seq as i64);
        let project = Project::from_draft(ProjectId(format!("prj-{seq:03}")), draft, created_at);
        self.rows
            .lock()
            .expect("repository mutex poisoned")
            .push(project.clone());
        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut rows = self.rows();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        Ok(self.rows().into_iter().find(|project| &project.id == id))
    }
}

pub(super) struct UnavailableProjects;

#[async_trait]
impl ProjectRepository for UnavailableProjects {
    async fn insert(&self, _draft: ProjectDraft) -> Result<Project, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn fetch(&self, _id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn project_router_with_service(service: ProjectService<MemoryProjects>) -> axum::Router {
    project_router(Arc::new(service))
}
