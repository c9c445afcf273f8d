//! Renovation cost estimation.
//!
//! The [`estimate`] module owns the line-item model and its derived totals. The
//! remaining modules are the collaborators an editing session talks to: project
//! persistence, photo storage, site photo analysis and the labor cost index.

pub mod analysis;
pub mod config;
pub mod error;
pub mod estimate;
pub mod labor;
pub mod photos;
pub mod projects;
pub mod sessions;
pub mod supabase;
pub mod telemetry;
