//! Editing sessions.
//!
//! Each session owns exactly one [`Estimate`]. Handlers borrow it under a short
//! mutex guard; collaborator calls happen between guards so a failed upload,
//! analysis or save never leaves the estimate half-modified.

pub mod router;
mod store;
mod workspace;

#[cfg(test)]
mod tests;

pub use router::session_router;
pub use store::{EstimateSessions, SessionId};
pub use workspace::{AnalysisOutcome, EstimateWorkspace, PhotoUpload};

use crate::analysis::AnalysisError;
use crate::estimate::{SheetError, TaskId};
use crate::labor::LaborIndexError;
use crate::photos::StorageError;
use crate::projects::ProjectServiceError;

/// Error raised by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("estimate session {0} not found")]
    SessionNotFound(SessionId),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("photo {0} is not attached to this estimate")]
    PhotoNotFound(String),
    #[error("base area is not set")]
    BaseAreaUnset,
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Labor(#[from] LaborIndexError),
    #[error(transparent)]
    Project(#[from] ProjectServiceError),
    #[error(transparent)]
    Sheet(#[from] SheetError),
}
