//! Saved estimate snapshots.
//!
//! Projects are written once and read back for the dashboard or to restore an
//! editing session. The hosted row store sits behind [`ProjectRepository`].

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod supabase;

#[cfg(test)]
mod tests;

pub use domain::{Project, ProjectDraft, ProjectId, ProjectSummary, UNASSIGNED_AUTHOR};
pub use repository::{ProjectRepository, RepositoryError};
pub use router::{project_router, DASHBOARD_PIN_HEADER};
pub use service::{ProjectService, ProjectServiceError, DEFAULT_DASHBOARD_PIN};
pub use supabase::SupabaseProjectRepository;
