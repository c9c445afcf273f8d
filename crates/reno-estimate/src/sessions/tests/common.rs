use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::analysis::{AnalysisError, SiteAnalysis, SiteAnalyzer};
use crate::estimate::{Category, ConstructionTemplate, Task, TaskId};
use crate::labor::{HistoricalIndex, KosisLaborIndex, LaborIndexError, LaborIndexProvider, LaborIndexSnapshot};
use crate::photos::{PhotoStorage, StorageError, UnconfiguredStorage};
use crate::projects::{Project, ProjectDraft, ProjectId, ProjectRepository, ProjectService, RepositoryError};
use crate::sessions::{session_router, EstimateWorkspace, SessionId};

pub(super) fn task(id: &str, included: bool, category: Category, quantity: f64, price: f64) -> Task {
    Task {
        id: TaskId(id.to_string()),
        included,
        category,
        name: id.to_string(),
        description: String::new(),
        unit_price: price,
        quantity,
    }
}

/// Three rows totalling 7,360,000 with the excluded row ignored.
pub(super) fn scenario_tasks() -> Vec<Task> {
    vec![
        task("demo", true, Category::Demolition, 32.0, 150_000.0),
        task("wall", true, Category::Wall, 32.0, 80_000.0),
        task("floor", false, Category::Flooring, 32.0, 65_000.0),
    ]
}

#[derive(Default)]
pub(super) struct MemoryProjects {
    rows: Mutex<Vec<Project>>,
}

#[async_trait]
impl ProjectRepository for MemoryProjects {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError> {
        let mut rows = self.rows.lock().expect("repository mutex poisoned");
        let id = ProjectId(format!("prj-{:03}", rows.len() + 1));
        let project = Project::from_draft(id, draft, Utc::now());
        rows.push(project.clone());
        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let mut rows = self.rows.lock().expect("repository mutex poisoned").clone();
        rows.reverse();
        Ok(rows)
    }

    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let rows = self.rows.lock().expect("repository mutex poisoned");
        Ok(rows.iter().find(|project| &project.id == id).cloned())
    }
}

/// Records uploads and deletes; can be switched to fail.
#[derive(Default)]
pub(super) struct RecordingStorage {
    pub(super) uploaded: Mutex<Vec<(String, String, usize)>>,
    pub(super) deleted: Mutex<Vec<String>>,
    pub(super) fail: bool,
}

impl RecordingStorage {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PhotoStorage for RecordingStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Rejected {
                status: 400,
                body: "Bucket not found".to_string(),
            });
        }
        self.uploaded.lock().expect("storage mutex poisoned").push((
            path.to_string(),
            content_type.to_string(),
            bytes.len(),
        ));
        Ok(format!("https://cdn.test/site-photos/{path}"))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Request("connection reset".to_string()));
        }
        self.deleted
            .lock()
            .expect("storage mutex poisoned")
            .push(path.to_string());
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

pub(super) struct FixedAnalyzer(pub(super) Result<SiteAnalysis, String>);

impl FixedAnalyzer {
    pub(super) fn recommending(labels: &[&str]) -> Self {
        Self(Ok(SiteAnalysis {
            needs_demolition: false,
            floor_condition: "장판 들뜸".to_string(),
            wall_condition: "도배 오염".to_string(),
            recommendations: labels.iter().map(|label| label.to_string()).collect(),
            estimated_pyung: Some(28.0),
            expert_advice: None,
        }))
    }
}

#[async_trait]
impl SiteAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _image_url: &str) -> Result<SiteAnalysis, AnalysisError> {
        self.0.clone().map_err(AnalysisError::Upstream)
    }

    async fn check_connection(&self) -> Result<String, AnalysisError> {
        Ok("ok".to_string())
    }
}

/// Serves the internal figures with a fixed clock.
pub(super) struct FixedLabor;

#[async_trait]
impl LaborIndexProvider for FixedLabor {
    async fn current(&self) -> Result<LaborIndexSnapshot, LaborIndexError> {
        Ok(KosisLaborIndex::default().snapshot_at(Utc::now()))
    }

    async fn historical(&self, target: NaiveDate) -> Result<HistoricalIndex, LaborIndexError> {
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date");
        Ok(KosisLaborIndex::default().historical_at(target, today))
    }
}

pub(super) fn workspace_with(
    storage: Arc<dyn PhotoStorage>,
    analyzer: Arc<dyn SiteAnalyzer>,
) -> Arc<EstimateWorkspace<MemoryProjects>> {
    let projects = Arc::new(ProjectService::new(Arc::new(MemoryProjects::default())));
    Arc::new(EstimateWorkspace::new(
        projects,
        storage,
        analyzer,
        Arc::new(FixedLabor),
    ))
}

pub(super) fn workspace() -> Arc<EstimateWorkspace<MemoryProjects>> {
    workspace_with(
        Arc::new(UnconfiguredStorage),
        Arc::new(FixedAnalyzer::recommending(&["바닥", "벽"])),
    )
}

/// Opens an empty session holding the three scenario rows at a 32 pyung base area.
pub(super) fn scenario_session(workspace: &EstimateWorkspace<MemoryProjects>) -> SessionId {
    let id = workspace.open(ConstructionTemplate::Interior, false);
    workspace
        .sessions()
        .with(&id, |estimate| {
            estimate.set_base_area(Some(32.0));
            estimate.extend_tasks(scenario_tasks());
        })
        .expect("session open");
    id
}

pub(super) fn router_for(workspace: Arc<EstimateWorkspace<MemoryProjects>>) -> axum::Router {
    session_router(workspace)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
