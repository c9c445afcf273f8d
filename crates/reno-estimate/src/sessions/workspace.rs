use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::store::{EstimateSessions, SessionId};
use super::SessionError;
use crate::analysis::{SiteAnalysis, SiteAnalyzer};
use crate::estimate::{
    Category, ConstructionTemplate, Estimate, EstimateSheet, RecommendationSet, TaskId, TaskUpdate,
    UploadedImage,
};
use crate::labor::{LaborIndexProvider, LaborIndexSnapshot};
use crate::photos::{content_type_for, object_path, PhotoStorage};
use crate::projects::{Project, ProjectId, ProjectRepository, ProjectService};

/// Decoded photo upload request.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub analysis: SiteAnalysis,
    pub applied: usize,
}

/// Editing sessions together with the collaborators they call out to.
pub struct EstimateWorkspace<R> {
    sessions: EstimateSessions,
    projects: Arc<ProjectService<R>>,
    photos: Arc<dyn PhotoStorage>,
    analyzer: Arc<dyn SiteAnalyzer>,
    labor: Arc<dyn LaborIndexProvider>,
}

impl<R> EstimateWorkspace<R>
where
    R: ProjectRepository + 'static,
{
    pub fn new(
        projects: Arc<ProjectService<R>>,
        photos: Arc<dyn PhotoStorage>,
        analyzer: Arc<dyn SiteAnalyzer>,
        labor: Arc<dyn LaborIndexProvider>,
    ) -> Self {
        Self {
            sessions: EstimateSessions::new(),
            projects,
            photos,
            analyzer,
            labor,
        }
    }

    pub fn sessions(&self) -> &EstimateSessions {
        &self.sessions
    }

    pub fn projects(&self) -> &Arc<ProjectService<R>> {
        &self.projects
    }

    pub fn open(&self, template: ConstructionTemplate, seeded: bool) -> SessionId {
        let estimate = if seeded {
            Estimate::new(template)
        } else {
            Estimate::empty(template)
        };
        let id = self.sessions.open(estimate);
        info!(session_id = %id, template = template.label(), seeded, "estimate session opened");
        id
    }

    pub fn update_task(
        &self,
        id: &SessionId,
        task_id: &TaskId,
        update: TaskUpdate,
    ) -> Result<(), SessionError> {
        if self
            .sessions
            .with(id, |estimate| estimate.update_task(task_id, update))?
        {
            Ok(())
        } else {
            Err(SessionError::TaskNotFound(task_id.clone()))
        }
    }

    pub fn delete_task(&self, id: &SessionId, task_id: &TaskId) -> Result<(), SessionError> {
        self.sessions
            .with(id, |estimate| estimate.delete_task(task_id))?
            .map(|_| ())
            .ok_or_else(|| SessionError::TaskNotFound(task_id.clone()))
    }

    pub fn sync_area(&self, id: &SessionId) -> Result<usize, SessionError> {
        self.sessions
            .with(id, Estimate::sync_area_to_base)?
            .ok_or(SessionError::BaseAreaUnset)
    }

    /// Fetches the wage table and prices every mapped category.
    pub async fn apply_labor_prices(
        &self,
        id: &SessionId,
    ) -> Result<(LaborIndexSnapshot, usize), SessionError> {
        self.ensure_open(id)?;
        let snapshot = self.labor.current().await?;
        let table = snapshot.price_table();
        let updated = self
            .sessions
            .with(id, |estimate| estimate.apply_price_table(&table))?;
        info!(session_id = %id, source = %snapshot.source, updated, "labor prices applied");
        Ok((snapshot, updated))
    }

    /// Stores the photo first; the estimate only references it once the upload succeeded.
    pub async fn upload_photo(
        &self,
        id: &SessionId,
        upload: PhotoUpload,
    ) -> Result<UploadedImage, SessionError> {
        self.ensure_open(id)?;
        if upload.bytes.is_empty() {
            return Err(SessionError::InvalidInput("photo is empty".to_string()));
        }

        let path = object_path(&upload.file_name, Utc::now());
        let content_type = content_type_for(&upload.file_name);
        let url = self
            .photos
            .upload(&path, upload.bytes, &content_type)
            .await
            .map_err(|err| {
                warn!(session_id = %id, error = %err, "photo upload failed");
                err
            })?;

        let image = UploadedImage {
            url,
            path,
            category: upload.category,
        };
        self.sessions
            .with(id, |estimate| estimate.attach_image(image.clone()))?;
        Ok(image)
    }

    /// Removes the stored object, then the reference. A failed delete keeps both.
    pub async fn delete_photo(&self, id: &SessionId, path: &str) -> Result<(), SessionError> {
        if !self.sessions.with(id, |estimate| estimate.has_image(path))? {
            return Err(SessionError::PhotoNotFound(path.to_string()));
        }

        self.photos.delete(path).await.map_err(|err| {
            warn!(session_id = %id, path, error = %err, "photo delete failed");
            err
        })?;

        self.sessions
            .with(id, |estimate| estimate.detach_image(path))?;
        Ok(())
    }

    /// Analyzes a photo and switches on every category it implies: the
    /// recommended ones, plus demolition when the photo shows debris.
    pub async fn analyze_photo(
        &self,
        id: &SessionId,
        image_url: &str,
    ) -> Result<AnalysisOutcome, SessionError> {
        self.ensure_open(id)?;
        let analysis = self.analyzer.analyze(image_url).await?;
        let recommendations: RecommendationSet = Category::ordered()
            .into_iter()
            .filter(|category| analysis.implies(*category))
            .collect();
        let applied = self
            .sessions
            .with(id, |estimate| estimate.apply_recommendations(&recommendations))?;
        info!(session_id = %id, applied, "site analysis applied");
        Ok(AnalysisOutcome { analysis, applied })
    }

    pub async fn save(
        &self,
        id: &SessionId,
        name: &str,
        author: Option<String>,
    ) -> Result<Project, SessionError> {
        let estimate = self.sessions.snapshot(id)?;
        Ok(self.projects.save_estimate(&estimate, name, author).await?)
    }

    /// Replaces the session's estimate with a saved project.
    pub async fn load(&self, id: &SessionId, project_id: &ProjectId) -> Result<Project, SessionError> {
        self.ensure_open(id)?;
        let project = self.projects.get(project_id).await?;
        self.sessions.replace(id, project.to_estimate())?;
        info!(session_id = %id, project_id = %project.id, "project loaded into session");
        Ok(project)
    }

    pub fn sheet(&self, id: &SessionId, issued_on: NaiveDate) -> Result<EstimateSheet, SessionError> {
        self.sessions
            .with(id, |estimate| EstimateSheet::from_estimate(estimate, issued_on))
    }

    fn ensure_open(&self, id: &SessionId) -> Result<(), SessionError> {
        if self.sessions.contains(id) {
            Ok(())
        } else {
            Err(SessionError::SessionNotFound(id.clone()))
        }
    }
}
