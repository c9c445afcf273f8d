use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use reno_estimate::analysis::{GeminiAnalyzer, SiteAnalyzer};
use reno_estimate::config::AppConfig;
use reno_estimate::labor::{KosisLaborIndex, LaborIndexProvider};
use reno_estimate::photos::{PhotoStorage, SupabaseStorage, UnconfiguredStorage};
use reno_estimate::projects::{
    Project, ProjectDraft, ProjectId, ProjectRepository, RepositoryError,
    SupabaseProjectRepository,
};
use reno_estimate::supabase::SupabaseClient;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) collaborators: Collaborators,
}

/// Shared handles to the external services.
#[derive(Clone)]
pub(crate) struct Collaborators {
    pub(crate) photos: Arc<dyn PhotoStorage>,
    pub(crate) analyzer: Arc<dyn SiteAnalyzer>,
    pub(crate) labor: Arc<dyn LaborIndexProvider>,
    pub(crate) supabase_url: Option<String>,
    pub(crate) photo_bucket: Option<String>,
}

impl Collaborators {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        let photos: Arc<dyn PhotoStorage> = match &config.supabase {
            Some(supabase) => Arc::new(SupabaseStorage::new(
                SupabaseClient::from_config(supabase),
                supabase.photo_bucket.clone(),
            )),
            None => Arc::new(UnconfiguredStorage),
        };

        Self {
            photos,
            analyzer: Arc::new(GeminiAnalyzer::from_config(&config.vision)),
            labor: Arc::new(KosisLaborIndex::from_config(&config.labor)),
            supabase_url: config.supabase.as_ref().map(|s| s.url.clone()),
            photo_bucket: config.supabase.as_ref().map(|s| s.photo_bucket.clone()),
        }
    }
}

/// Project rows in the hosted table, or process memory when none is configured.
pub(crate) enum ProjectStore {
    Supabase(SupabaseProjectRepository),
    Memory(InMemoryProjectRepository),
}

impl ProjectStore {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        match &config.supabase {
            Some(supabase) => Self::Supabase(SupabaseProjectRepository::new(
                SupabaseClient::from_config(supabase),
                supabase.projects_table.clone(),
            )),
            None => Self::Memory(InMemoryProjectRepository::default()),
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Supabase(_) => "supabase",
            Self::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl ProjectRepository for ProjectStore {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError> {
        match self {
            Self::Supabase(repository) => repository.insert(draft).await,
            Self::Memory(repository) => repository.insert(draft).await,
        }
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        match self {
            Self::Supabase(repository) => repository.list().await,
            Self::Memory(repository) => repository.list().await,
        }
    }

    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        match self {
            Self::Supabase(repository) => repository.fetch(id).await,
            Self::Memory(repository) => repository.fetch(id).await,
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProjectRepository {
    records: Arc<Mutex<Vec<Project>>>,
    sequence: Arc<AtomicU64>,
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn insert(&self, draft: ProjectDraft) -> Result<Project, RepositoryError> {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let project = Project::from_draft(ProjectId(format!("local-{seq:06}")), draft, Utc::now());
        let mut guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        guard.push(project.clone());
        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        Ok(guard.iter().rev().cloned().collect())
    }

    async fn fetch(&self, id: &ProjectId) -> Result<Option<Project>, RepositoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))?;
        Ok(guard.iter().find(|project| &project.id == id).cloned())
    }
}

/// Shows only the first `visible` characters of a configured value.
pub(crate) fn mask(value: &str, visible: usize) -> String {
    let prefix: String = value.chars().take(visible).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_projects_list_newest_first() {
        let repository = InMemoryProjectRepository::default();
        for name in ["first", "second"] {
            repository
                .insert(ProjectDraft {
                    name: name.to_string(),
                    author: None,
                    construction_type: Default::default(),
                    base_area: None,
                    tasks: Vec::new(),
                    images: Vec::new(),
                    notes: None,
                })
                .await
                .expect("insert succeeds");
        }

        let names: Vec<_> = repository
            .list()
            .await
            .expect("list succeeds")
            .into_iter()
            .map(|project| project.name)
            .collect();
        assert_eq!(names, vec!["second".to_string(), "first".to_string()]);
    }

    #[test]
    fn mask_keeps_a_short_prefix() {
        assert_eq!(mask("https://demo.supabase.co", 15), "https://demo.su...");
        assert_eq!(mask("abc", 5), "abc...");
    }
}
